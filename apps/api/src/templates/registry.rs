//! The bundled default template catalogue.
//!
//! Immutable at runtime. Used as the last lookup tier when the store cannot answer,
//! as the seed for `initialize`, and as the target of every reset.

use crate::templates::defaults;
use crate::templates::models::{TemplateKey, TemplateUpsert};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultTemplate {
    pub prompt_id: &'static str,
    pub category: &'static str,
    pub sub_category: &'static str,
    pub key: &'static str,
    pub text: &'static str,
    pub description: &'static str,
    pub version: i32,
}

impl DefaultTemplate {
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::new(self.category, self.sub_category, self.key)
    }

    pub fn matches(&self, key: &TemplateKey) -> bool {
        self.category == key.category && self.sub_category == key.sub_category && self.key == key.key
    }

    /// The row this entry writes into the store.
    pub fn to_upsert(&self, changed_by: &str) -> TemplateUpsert {
        TemplateUpsert {
            prompt_id: self.prompt_id.to_string(),
            category: self.category.to_string(),
            sub_category: self.sub_category.to_string(),
            key: self.key.to_string(),
            text: self.text.to_string(),
            description: Some(self.description.to_string()),
            is_active: true,
            is_default: true,
            version: self.version,
            changed_by: changed_by.to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

macro_rules! default_template {
    ($id:literal, $cat:literal, $sub:literal, $key:literal, $text:expr, $desc:literal) => {
        DefaultTemplate {
            prompt_id: $id,
            category: $cat,
            sub_category: $sub,
            key: $key,
            text: $text,
            description: $desc,
            version: 1,
        }
    };
}

/// Append-only. Never change a `prompt_id` once shipped; it is the upsert key.
const BUNDLED: &[DefaultTemplate] = &[
    default_template!(
        "passage-system",
        "passage",
        "system",
        "system_base",
        defaults::PASSAGE_SYSTEM,
        "System prompt for reading passage generation"
    ),
    default_template!(
        "passage-user",
        "passage",
        "generation",
        "user_prompt",
        defaults::PASSAGE_USER,
        "Passage request; expects topic, gradeLevel, wordCount, difficulty"
    ),
    default_template!(
        "question-system",
        "question",
        "system",
        "system_base",
        defaults::QUESTION_SYSTEM,
        "System prompt for question set generation"
    ),
    default_template!(
        "question-user",
        "question",
        "generation",
        "user_prompt",
        defaults::QUESTION_USER,
        "Question request; embeds a question type instruction via {questionTypePrompt}"
    ),
    default_template!(
        "question-type-multiple-choice",
        "question_type",
        "instructions",
        "multiple_choice",
        defaults::TYPE_MULTIPLE_CHOICE,
        "Instructions for four-option multiple choice questions"
    ),
    default_template!(
        "question-type-true-false",
        "question_type",
        "instructions",
        "true_false",
        defaults::TYPE_TRUE_FALSE,
        "Instructions for true/false statements"
    ),
    default_template!(
        "question-type-short-answer",
        "question_type",
        "instructions",
        "short_answer",
        defaults::TYPE_SHORT_ANSWER,
        "Instructions for short written answers"
    ),
    default_template!(
        "question-type-fill-in-blank",
        "question_type",
        "instructions",
        "fill_in_blank",
        defaults::TYPE_FILL_IN_BLANK,
        "Instructions for cloze items"
    ),
    default_template!(
        "question-type-vocabulary",
        "question_type",
        "instructions",
        "vocabulary",
        defaults::TYPE_VOCABULARY,
        "Instructions for vocabulary-in-context questions"
    ),
    default_template!(
        "question-type-main-idea",
        "question_type",
        "instructions",
        "main_idea",
        defaults::TYPE_MAIN_IDEA,
        "Instructions for main idea questions"
    ),
    default_template!(
        "question-type-inference",
        "question_type",
        "instructions",
        "inference",
        defaults::TYPE_INFERENCE,
        "Instructions for inference questions"
    ),
];

#[derive(Debug, Clone)]
pub struct DefaultRegistry {
    entries: Vec<DefaultTemplate>,
}

impl DefaultRegistry {
    pub fn bundled() -> Self {
        Self {
            entries: BUNDLED.to_vec(),
        }
    }

    pub fn new(entries: Vec<DefaultTemplate>) -> Self {
        Self { entries }
    }

    pub fn find(&self, key: &TemplateKey) -> Option<&DefaultTemplate> {
        self.entries.iter().find(|e| e.matches(key))
    }

    pub fn find_by_prompt_id(&self, prompt_id: &str) -> Option<&DefaultTemplate> {
        self.entries.iter().find(|e| e.prompt_id == prompt_id)
    }

    /// Lookup on the two-level address used by the legacy schema generation.
    pub fn find_by_category_key(&self, category: &str, key: &str) -> Option<&DefaultTemplate> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefaultTemplate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::templates::substitute::placeholders;

    #[test]
    fn test_bundled_prompt_ids_are_unique() {
        let registry = DefaultRegistry::bundled();
        let ids: HashSet<_> = registry.iter().map(|e| e.prompt_id).collect();
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn test_bundled_addresses_are_unique() {
        let registry = DefaultRegistry::bundled();
        let keys: HashSet<_> = registry.iter().map(|e| e.template_key()).collect();
        assert_eq!(keys.len(), registry.len());
    }

    #[test]
    fn test_bundled_category_key_pairs_are_unique() {
        // Legacy rows are matched on (category, key) alone.
        let registry = DefaultRegistry::bundled();
        let pairs: HashSet<_> = registry.iter().map(|e| (e.category, e.key)).collect();
        assert_eq!(pairs.len(), registry.len());
    }

    #[test]
    fn test_find_by_address_and_prompt_id() {
        let registry = DefaultRegistry::bundled();
        let key = TemplateKey::new("passage", "system", "system_base");
        let entry = registry.find(&key).unwrap();
        assert_eq!(entry.prompt_id, "passage-system");
        assert_eq!(
            registry.find_by_prompt_id("passage-system").unwrap().template_key(),
            key
        );
        assert!(registry
            .find(&TemplateKey::new("passage", "system", "missing"))
            .is_none());
        assert!(registry.find_by_prompt_id("missing").is_none());
    }

    #[test]
    fn test_question_user_prompt_embeds_type_instructions() {
        let registry = DefaultRegistry::bundled();
        let entry = registry.find_by_prompt_id("question-user").unwrap();
        assert!(placeholders(entry.text).contains(&"questionTypePrompt"));
    }

    #[test]
    fn test_to_upsert_marks_default_and_active() {
        let registry = DefaultRegistry::bundled();
        let upsert = registry
            .find_by_prompt_id("passage-user")
            .unwrap()
            .to_upsert("system");
        assert!(upsert.is_default);
        assert!(upsert.is_active);
        assert_eq!(upsert.version, 1);
        assert_eq!(upsert.changed_by, "system");
    }
}
