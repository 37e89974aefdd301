//! Persistent template storage. The database is the source of truth.

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::{PgLegacyTemplateSource, PgTemplateStore};

use async_trait::async_trait;

use crate::templates::error::StoreError;
use crate::templates::models::{
    TemplateChange, TemplateChangeRow, TemplateFilter, TemplateKey, TemplateRecord, TemplateUpsert,
};

/// Store contract used by the resolver and the version manager.
///
/// Writes are last-write-wins per `prompt_id`; nothing here serialises concurrent
/// administrative edits.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// The active record at `key`, if any.
    async fn get(&self, key: &TemplateKey) -> Result<Option<TemplateRecord>, StoreError>;

    /// The record with `prompt_id`, active or not.
    async fn get_by_prompt_id(&self, prompt_id: &str)
        -> Result<Option<TemplateRecord>, StoreError>;

    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<TemplateRecord>, StoreError>;

    /// Inserts or overwrites the row with `record.prompt_id`. On conflict the
    /// version becomes `max(stored + 1, record.version)` when the text changes and
    /// `max(stored, record.version)` otherwise; creation metadata is kept.
    async fn upsert(&self, record: &TemplateUpsert) -> Result<TemplateRecord, StoreError>;

    /// Inserts `record` unless a row with the same `prompt_id` (or the same active
    /// address) already exists. Returns `None` when nothing was written.
    async fn insert_if_absent(
        &self,
        record: &TemplateUpsert,
    ) -> Result<Option<TemplateRecord>, StoreError>;

    /// Replaces the text and increments the version.
    async fn update_text(
        &self,
        prompt_id: &str,
        text: &str,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError>;

    async fn set_active(
        &self,
        prompt_id: &str,
        is_active: bool,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError>;

    /// Bulk administrative wipe. Returns the number of rows removed.
    async fn delete_all(&self, filter: &TemplateFilter) -> Result<u64, StoreError>;

    async fn append_history(&self, change: &TemplateChange) -> Result<(), StoreError>;

    /// History rows for `prompt_id`, oldest version first.
    async fn history(&self, prompt_id: &str) -> Result<Vec<TemplateChangeRow>, StoreError>;
}
