use thiserror::Error;

use crate::templates::models::TemplateKey;

/// Failures of the persistent template store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template store unavailable: {0}")]
    Unavailable(String),

    #[error("no stored template with prompt_id '{0}'")]
    MissingRecord(String),

    /// Another active row already holds the address this `prompt_id` would take.
    #[error("another active template already holds the address of '{0}'")]
    AddressConflict(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    /// Neither the store nor the bundled defaults know this address.
    #[error("template not found: {0}")]
    NotFound(TemplateKey),

    #[error("no default template registered for prompt_id '{0}'")]
    UnknownDefault(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no stored template with prompt_id '{0}'")]
    UnknownPrompt(String),

    #[error("cannot activate '{0}': another active template holds its address")]
    AddressConflict(String),

    #[error("template store unavailable during {operation}{}: {source}", fmt_prompt(.prompt_id))]
    StoreUnavailable {
        operation: &'static str,
        prompt_id: Option<String>,
        #[source]
        source: StoreError,
    },
}

fn fmt_prompt(prompt_id: &Option<String>) -> String {
    prompt_id
        .as_deref()
        .map(|id| format!(" of '{id}'"))
        .unwrap_or_default()
}

impl TemplateError {
    /// Wraps a store failure on an administrative path. A missing row becomes
    /// `UnknownPrompt`, an address clash `AddressConflict`; everything else is
    /// surfaced as unavailability.
    pub fn store(operation: &'static str, prompt_id: Option<&str>, source: StoreError) -> Self {
        match source {
            StoreError::MissingRecord(id) => TemplateError::UnknownPrompt(id),
            StoreError::AddressConflict(id) => TemplateError::AddressConflict(id),
            source => TemplateError::StoreUnavailable {
                operation,
                prompt_id: prompt_id.map(str::to_string),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_maps_to_unknown_prompt() {
        let err = TemplateError::store(
            "update",
            Some("passage-system"),
            StoreError::MissingRecord("passage-system".to_string()),
        );
        assert!(matches!(err, TemplateError::UnknownPrompt(id) if id == "passage-system"));
    }

    #[test]
    fn test_store_unavailable_message_names_operation_and_prompt() {
        let err = TemplateError::store(
            "reset",
            Some("passage-system"),
            StoreError::Unavailable("connection refused".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("reset"), "{msg}");
        assert!(msg.contains("passage-system"), "{msg}");
        assert!(msg.contains("connection refused"), "{msg}");
    }

    #[test]
    fn test_store_unavailable_without_prompt_id() {
        let err = TemplateError::store(
            "initialize",
            None,
            StoreError::Unavailable("timeout".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "template store unavailable during initialize: template store unavailable: timeout"
        );
    }

    #[test]
    fn test_address_conflict_is_not_an_outage() {
        let err = TemplateError::store(
            "set-active",
            Some("passage-system"),
            StoreError::AddressConflict("passage-system".to_string()),
        );
        assert!(matches!(err, TemplateError::AddressConflict(id) if id == "passage-system"));
    }
}
