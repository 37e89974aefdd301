//! CSV export of template records.

use std::fmt::Write;

use crate::templates::models::TemplateRecord;

pub const CSV_HEADER: &str = "prompt_id,category,sub_category,key,version,is_active,is_default,\
description,text,created_at,updated_at,created_by,updated_by";

/// Renders records as CSV, one row per record in the order given.
pub fn render_csv(records: &[TemplateRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + records.len() * 256);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for r in records {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_escape(&r.prompt_id),
            csv_escape(&r.category),
            csv_escape(&r.sub_category),
            csv_escape(&r.key),
            r.version,
            r.is_active,
            r.is_default,
            csv_escape(r.description.as_deref().unwrap_or("")),
            csv_escape(&r.text),
            r.created_at.to_rfc3339(),
            r.updated_at.to_rfc3339(),
            csv_escape(r.created_by.as_deref().unwrap_or("")),
            csv_escape(r.updated_by.as_deref().unwrap_or("")),
        );
    }
    out
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
