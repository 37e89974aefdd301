//! Administrative write paths: bootstrap, forced reinitialization, reset-to-default,
//! text updates, activation, wipes and legacy migration.
//!
//! Every path invalidates each cache address it can affect before returning.
//! Store failures are surfaced, never replaced by registry data.
//!
//! Concurrent edits to one `prompt_id` are not serialised here: the store applies
//! them last-write-wins and the version reflects commit order, not submission order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::templates::cache::TemplateCache;
use crate::templates::error::TemplateError;
use crate::templates::migration::{
    plan_legacy_migration, LegacyTemplateSource, MigrationReport, SchemaGeneration,
};
use crate::templates::models::{
    ChangeKind, TemplateChange, TemplateChangeRow, TemplateFilter, TemplateKey, TemplateRecord,
};
use crate::templates::registry::DefaultRegistry;
use crate::templates::store::TemplateStore;

/// Recorded as `updated_by` for registry-driven writes.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Rows written, migrated ones included.
    pub count: usize,
    /// Rows carried forward from the legacy generation.
    pub migrated: usize,
}

pub struct TemplateManager {
    store: Arc<dyn TemplateStore>,
    registry: Arc<DefaultRegistry>,
    cache: Arc<TemplateCache>,
    legacy: Option<Arc<dyn LegacyTemplateSource>>,
    generation: SchemaGeneration,
}

impl TemplateManager {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        registry: Arc<DefaultRegistry>,
        cache: Arc<TemplateCache>,
        legacy: Option<Arc<dyn LegacyTemplateSource>>,
        generation: SchemaGeneration,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
            legacy,
            generation,
        }
    }

    /// Seeds the store from the registry.
    ///
    /// Without `force_reset` existing rows are left alone, and on a legacy deployment
    /// the legacy rows are carried forward first so operator edits win over defaults.
    /// With `force_reset` every registry entry overwrites its row.
    pub async fn initialize(&self, force_reset: bool) -> Result<InitReport, TemplateError> {
        info!(
            "Initializing templates (force_reset={force_reset}, generation={})",
            self.generation
        );

        let mut report = InitReport::default();
        if !force_reset && self.generation == SchemaGeneration::Legacy {
            report.migrated = self.migrate_legacy().await?.migrated;
            report.count = report.migrated;
        }

        if force_reset {
            report.count += self.overwrite_from_registry().await?;
        } else {
            report.count += self.fill_from_registry().await?;
        }

        info!(
            "Template initialization wrote {} rows ({} migrated)",
            report.count, report.migrated
        );
        Ok(report)
    }

    async fn fill_from_registry(&self) -> Result<usize, TemplateError> {
        let mut written = 0;
        for entry in self.registry.iter() {
            let inserted = self
                .store
                .insert_if_absent(&entry.to_upsert(SYSTEM_ACTOR))
                .await
                .map_err(|e| TemplateError::store("initialize", Some(entry.prompt_id), e))?;
            if let Some(record) = inserted {
                self.cache.invalidate(&record.template_key());
                self.record_history(&record, ChangeKind::Initialize, None)
                    .await;
                written += 1;
            }
        }
        Ok(written)
    }

    async fn overwrite_from_registry(&self) -> Result<usize, TemplateError> {
        let previous: HashMap<String, (TemplateKey, i32)> = self
            .store
            .list(&TemplateFilter::everything())
            .await
            .map_err(|e| TemplateError::store("initialize", None, e))?
            .into_iter()
            .map(|r| (r.prompt_id.clone(), (r.template_key(), r.version)))
            .collect();

        let mut written = 0;
        for entry in self.registry.iter() {
            let record = self
                .store
                .upsert(&entry.to_upsert(SYSTEM_ACTOR))
                .await
                .map_err(|e| TemplateError::store("initialize", Some(entry.prompt_id), e))?;
            let before = previous.get(entry.prompt_id);
            self.invalidate_moved(before.map(|(key, _)| key), &record);
            // Version only moves when the text changed.
            if before.map_or(true, |(_, version)| *version != record.version) {
                self.record_history(&record, ChangeKind::Initialize, None)
                    .await;
            }
            written += 1;
        }
        Ok(written)
    }

    /// Overwrites one stored row with its registry entry.
    pub async fn reset_one(&self, prompt_id: &str) -> Result<TemplateRecord, TemplateError> {
        let entry = self
            .registry
            .find_by_prompt_id(prompt_id)
            .ok_or_else(|| TemplateError::UnknownDefault(prompt_id.to_string()))?;

        let previous = self
            .store
            .get_by_prompt_id(prompt_id)
            .await
            .map_err(|e| TemplateError::store("reset", Some(prompt_id), e))?
            .map(|r| r.template_key());

        let record = self
            .store
            .upsert(&entry.to_upsert(SYSTEM_ACTOR))
            .await
            .map_err(|e| TemplateError::store("reset", Some(prompt_id), e))?;
        self.invalidate_moved(previous.as_ref(), &record);
        self.record_history(&record, ChangeKind::Reset, None).await;

        info!("Reset template {prompt_id} to default (version {})", record.version);
        Ok(record)
    }

    /// Replaces a template's text. Returns the new version.
    pub async fn update_text(
        &self,
        prompt_id: &str,
        new_text: &str,
        changed_by: &str,
        change_reason: Option<&str>,
    ) -> Result<i32, TemplateError> {
        if new_text.trim().is_empty() {
            return Err(TemplateError::Validation(
                "template text cannot be empty".to_string(),
            ));
        }

        let record = self
            .store
            .update_text(prompt_id, new_text, changed_by)
            .await
            .map_err(|e| TemplateError::store("update", Some(prompt_id), e))?;
        self.cache.invalidate(&record.template_key());
        self.record_history(&record, ChangeKind::Update, change_reason)
            .await;

        info!(
            "Updated template {prompt_id} to version {} (by {changed_by})",
            record.version
        );
        Ok(record.version)
    }

    pub async fn set_active(
        &self,
        prompt_id: &str,
        is_active: bool,
        changed_by: &str,
    ) -> Result<TemplateRecord, TemplateError> {
        let record = self
            .store
            .set_active(prompt_id, is_active, changed_by)
            .await
            .map_err(|e| TemplateError::store("set-active", Some(prompt_id), e))?;
        self.cache.invalidate(&record.template_key());

        info!("Template {prompt_id} is_active={is_active} (by {changed_by})");
        Ok(record)
    }

    /// Bulk delete. Clears the whole cache.
    pub async fn wipe(&self, category: Option<&str>) -> Result<u64, TemplateError> {
        let filter = TemplateFilter {
            category: category.map(str::to_string),
            ..TemplateFilter::everything()
        };
        let deleted = self
            .store
            .delete_all(&filter)
            .await
            .map_err(|e| TemplateError::store("wipe", None, e))?;
        self.cache.clear();

        warn!(
            "Wiped {deleted} templates (category={})",
            category.unwrap_or("*")
        );
        Ok(deleted)
    }

    /// Carries legacy-generation rows forward, one row per address (see
    /// [`plan_legacy_migration`]). Rows whose `prompt_id` or active address already
    /// exists in the current generation are skipped, as are superseded rows.
    pub async fn migrate_legacy(&self) -> Result<MigrationReport, TemplateError> {
        let legacy = self.legacy.as_ref().ok_or_else(|| {
            TemplateError::Validation("no legacy template source is configured".to_string())
        })?;

        let rows = legacy
            .fetch_all()
            .await
            .map_err(|e| TemplateError::store("migrate-legacy", None, e))?;

        let plan = plan_legacy_migration(&rows, &self.registry);
        let mut report = MigrationReport {
            migrated: 0,
            skipped: plan.superseded,
        };
        for upsert in &plan.upserts {
            let inserted = self
                .store
                .insert_if_absent(&upsert)
                .await
                .map_err(|e| {
                    TemplateError::store("migrate-legacy", Some(upsert.prompt_id.as_str()), e)
                })?;
            match inserted {
                Some(record) => {
                    self.cache.invalidate(&record.template_key());
                    report.migrated += 1;
                }
                None => report.skipped += 1,
            }
        }

        info!(
            "Legacy migration: {} migrated, {} skipped",
            report.migrated, report.skipped
        );
        Ok(report)
    }

    pub async fn list(&self, filter: &TemplateFilter) -> Result<Vec<TemplateRecord>, TemplateError> {
        self.store
            .list(filter)
            .await
            .map_err(|e| TemplateError::store("list", None, e))
    }

    /// Every record, active or not, in creation order.
    pub async fn export_all(&self) -> Result<Vec<TemplateRecord>, TemplateError> {
        self.store
            .list(&TemplateFilter::everything())
            .await
            .map_err(|e| TemplateError::store("export", None, e))
    }

    pub async fn history(&self, prompt_id: &str) -> Result<Vec<TemplateChangeRow>, TemplateError> {
        self.store
            .history(prompt_id)
            .await
            .map_err(|e| TemplateError::store("history", Some(prompt_id), e))
    }

    /// Invalidates the record's address and, if the write moved it, the old one.
    fn invalidate_moved(&self, previous: Option<&TemplateKey>, record: &TemplateRecord) {
        let current = record.template_key();
        if let Some(old) = previous.filter(|old| **old != current) {
            self.cache.invalidate(old);
        }
        self.cache.invalidate(&current);
    }

    // Audit only: the write has committed and the cache is already clean.
    async fn record_history(
        &self,
        record: &TemplateRecord,
        kind: ChangeKind,
        change_reason: Option<&str>,
    ) {
        let change = TemplateChange {
            prompt_id: record.prompt_id.clone(),
            version: record.version,
            text: record.text.clone(),
            kind,
            changed_by: record.updated_by.clone(),
            change_reason: change_reason.map(str::to_string),
        };
        if let Err(e) = self.store.append_history(&change).await {
            warn!(
                "Failed to record {} history for {} v{}: {e}",
                kind.as_str(),
                record.prompt_id,
                record.version
            );
        }
    }
}
