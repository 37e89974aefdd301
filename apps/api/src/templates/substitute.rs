//! Placeholder expansion for prompt templates.
//!
//! A placeholder is `{name}` where `name` is one or more ASCII letters, digits or
//! underscores. Any other brace text (JSON examples embedded in prompts, for instance)
//! is copied through untouched.
//!
//! Expansion is a single left-to-right pass. Substituted values are never re-scanned,
//! and placeholders without a value are left in place so templates can be filled in
//! several stages.

use std::collections::HashMap;

/// Replaces every `{name}` that has an entry in `variables`.
pub fn substitute(text: &str, variables: &HashMap<String, String>) -> String {
    if variables.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        match placeholder_at(after) {
            Some(name) => {
                let token_len = name.len() + 2;
                match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&after[..token_len]),
                }
                rest = &after[token_len..];
            }
            None => {
                out.push('{');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open..];
        match placeholder_at(after) {
            Some(name) => {
                if !names.contains(&name) {
                    names.push(name);
                }
                rest = &after[name.len() + 2..];
            }
            None => rest = &after[1..],
        }
    }
    names
}

/// If `s` starts with a well-formed `{name}` token, returns `name`.
fn placeholder_at(s: &str) -> Option<&str> {
    let body = s.strip_prefix('{')?;
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    if end == 0 || !body[end..].starts_with('}') {
        return None;
    }
    Some(&body[..end])
}
