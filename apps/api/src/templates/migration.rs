//! Schema generations of the template store.
//!
//! The legacy generation (`prompts`) addressed templates by `(category, prompt_key)`
//! only. It is read once, mapped through [`upgrade_legacy_row`] and written forward
//! into `prompt_templates`. Nothing in this service writes to the legacy table.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::templates::error::StoreError;
use crate::templates::models::{TemplateKey, TemplateUpsert};
use crate::templates::registry::DefaultRegistry;

pub const LEGACY_SUB_CATEGORY: &str = "general";
pub const LEGACY_MIGRATION_ACTOR: &str = "legacy-migration";

/// Which generation is canonical for a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    Legacy,
    #[default]
    Current,
}

impl FromStr for SchemaGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "v1" => Ok(Self::Legacy),
            "current" | "v2" => Ok(Self::Current),
            other => Err(format!(
                "unknown template schema generation '{other}' (expected 'legacy' or 'current')"
            )),
        }
    }
}

impl fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Current => f.write_str("current"),
        }
    }
}

/// A row of the legacy `prompts` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LegacyPromptRow {
    pub id: Uuid,
    pub category: String,
    pub prompt_key: String,
    pub prompt_text: String,
    pub is_active: bool,
    pub version: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only access to the legacy generation.
#[async_trait]
pub trait LegacyTemplateSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<LegacyPromptRow>, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub skipped: usize,
}

/// Maps a legacy row onto the current record shape.
///
/// Rows whose `(category, prompt_key)` matches a bundled default take that entry's
/// `prompt_id`, sub-category and description, so the two generations agree on
/// identity. Anything else lands under [`LEGACY_SUB_CATEGORY`] with a derived id.
pub fn upgrade_legacy_row(row: &LegacyPromptRow, registry: &DefaultRegistry) -> TemplateUpsert {
    let known = registry.find_by_category_key(&row.category, &row.prompt_key);

    let (prompt_id, sub_category, description, is_default) = match known {
        Some(entry) => (
            entry.prompt_id.to_string(),
            entry.sub_category.to_string(),
            Some(entry.description.to_string()),
            entry.text == row.prompt_text,
        ),
        None => (
            format!("legacy-{}", row.id),
            LEGACY_SUB_CATEGORY.to_string(),
            None,
            false,
        ),
    };

    TemplateUpsert {
        prompt_id,
        category: row.category.clone(),
        sub_category,
        key: row.prompt_key.clone(),
        text: row.prompt_text.clone(),
        description,
        is_active: row.is_active,
        is_default,
        version: row.version.unwrap_or(1).max(1),
        changed_by: LEGACY_MIGRATION_ACTOR.to_string(),
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    }
}

/// Rows to carry forward, one per target address, in legacy creation order.
#[derive(Debug, Clone, Default)]
pub struct LegacyPlan {
    pub upserts: Vec<TemplateUpsert>,
    /// Rows superseded by a better candidate for the same address, or inactive
    /// rows for an address the bundled defaults will seed.
    pub superseded: usize,
}

/// Picks one legacy row per target address: active first, then the highest
/// version, then the most recent `updated_at`.
///
/// An inactive row for a bundled default is not carried forward. It would claim
/// the default's `prompt_id` and stop the bootstrap from seeding an active row.
pub fn plan_legacy_migration(rows: &[LegacyPromptRow], registry: &DefaultRegistry) -> LegacyPlan {
    let mut best: HashMap<TemplateKey, (&LegacyPromptRow, TemplateUpsert)> = HashMap::new();
    for row in rows {
        let upsert = upgrade_legacy_row(row, registry);
        match best.entry(upsert.template_key()) {
            Entry::Vacant(slot) => {
                slot.insert((row, upsert));
            }
            Entry::Occupied(mut slot) => {
                if preference(row) > preference(slot.get().0) {
                    slot.insert((row, upsert));
                }
            }
        }
    }

    let mut chosen: Vec<_> = best
        .into_values()
        .filter(|(row, upsert)| {
            row.is_active || registry.find_by_prompt_id(&upsert.prompt_id).is_none()
        })
        .collect();
    chosen.sort_by(|a, b| (a.0.created_at, a.0.id).cmp(&(b.0.created_at, b.0.id)));

    LegacyPlan {
        superseded: rows.len() - chosen.len(),
        upserts: chosen.into_iter().map(|(_, upsert)| upsert).collect(),
    }
}

fn preference(row: &LegacyPromptRow) -> (bool, i32, DateTime<Utc>) {
    (row.is_active, row.version.unwrap_or(1), row.updated_at)
}

#[cfg(test)]
#[async_trait]
impl LegacyTemplateSource for Vec<LegacyPromptRow> {
    async fn fetch_all(&self) -> Result<Vec<LegacyPromptRow>, StoreError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(category: &str, key: &str, text: &str, version: Option<i32>) -> LegacyPromptRow {
        LegacyPromptRow {
            id: Uuid::new_v4(),
            category: category.to_string(),
            prompt_key: key.to_string(),
            prompt_text: text.to_string(),
            is_active: true,
            version,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_known_row_takes_registry_identity() {
        let registry = DefaultRegistry::bundled();
        let row = legacy("passage", "system_base", "Edited system prompt", Some(4));

        let upsert = upgrade_legacy_row(&row, &registry);
        assert_eq!(upsert.prompt_id, "passage-system");
        assert_eq!(upsert.sub_category, "system");
        assert_eq!(upsert.key, "system_base");
        assert_eq!(upsert.text, "Edited system prompt");
        assert_eq!(upsert.version, 4);
        assert!(!upsert.is_default);
        assert_eq!(upsert.changed_by, LEGACY_MIGRATION_ACTOR);
    }

    #[test]
    fn test_unedited_known_row_is_marked_default() {
        let registry = DefaultRegistry::bundled();
        let entry = registry.find_by_prompt_id("question-system").unwrap();
        let row = legacy("question", "system_base", entry.text, None);

        let upsert = upgrade_legacy_row(&row, &registry);
        assert!(upsert.is_default);
        assert_eq!(upsert.version, 1);
    }

    #[test]
    fn test_unknown_row_gets_derived_identity() {
        let registry = DefaultRegistry::bundled();
        let row = legacy("passage", "poetry_prompt", "Write a poem about {topic}", Some(0));

        let upsert = upgrade_legacy_row(&row, &registry);
        assert_eq!(upsert.prompt_id, format!("legacy-{}", row.id));
        assert_eq!(upsert.sub_category, LEGACY_SUB_CATEGORY);
        assert!(upsert.description.is_none());
        assert_eq!(upsert.version, 1, "versions start at 1");
    }

    #[test]
    fn test_inactive_flag_is_carried_forward() {
        let registry = DefaultRegistry::bundled();
        let mut row = legacy("passage", "system_base", "old", Some(2));
        row.is_active = false;
        assert!(!upgrade_legacy_row(&row, &registry).is_active);
    }

    #[test]
    fn test_schema_generation_parsing() {
        assert_eq!("legacy".parse::<SchemaGeneration>(), Ok(SchemaGeneration::Legacy));
        assert_eq!(" Current ".parse::<SchemaGeneration>(), Ok(SchemaGeneration::Current));
        assert_eq!("v1".parse::<SchemaGeneration>(), Ok(SchemaGeneration::Legacy));
        assert!("v3".parse::<SchemaGeneration>().is_err());
        assert_eq!(SchemaGeneration::default(), SchemaGeneration::Current);
    }

    fn aged(mut row: LegacyPromptRow, days_ago: i64, active: bool) -> LegacyPromptRow {
        let at = Utc::now() - chrono::Duration::days(days_ago);
        row.created_at = at;
        row.updated_at = at;
        row.is_active = active;
        row
    }

    #[test]
    fn test_plan_prefers_active_row_over_older_retired_one() {
        let registry = DefaultRegistry::bundled();
        let rows = vec![
            aged(legacy("passage", "system_base", "OLD retired", Some(1)), 2, false),
            aged(legacy("passage", "system_base", "LIVE edit", Some(2)), 1, true),
        ];

        let plan = plan_legacy_migration(&rows, &registry);
        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].text, "LIVE edit");
        assert!(plan.upserts[0].is_active);
        assert_eq!(plan.superseded, 1);
    }

    #[test]
    fn test_plan_breaks_ties_on_version_then_updated_at() {
        let registry = DefaultRegistry::bundled();
        let rows = vec![
            aged(legacy("passage", "poetry", "v3 older", Some(3)), 5, true),
            aged(legacy("passage", "poetry", "v2 newer", Some(2)), 1, true),
            aged(legacy("passage", "poetry", "v3 newer", Some(3)), 2, true),
        ];

        let plan = plan_legacy_migration(&rows, &registry);
        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].text, "v3 newer");
        assert_eq!(plan.superseded, 2);
    }

    #[test]
    fn test_plan_drops_inactive_only_rows_for_bundled_defaults() {
        let registry = DefaultRegistry::bundled();
        let rows = vec![
            aged(legacy("question", "system_base", "retired", Some(2)), 3, false),
            aged(legacy("passage", "poetry", "retired custom", Some(1)), 3, false),
        ];

        let plan = plan_legacy_migration(&rows, &registry);
        assert_eq!(plan.upserts.len(), 1, "unknown inactive rows are still kept");
        assert_eq!(plan.upserts[0].key, "poetry");
        assert!(!plan.upserts[0].is_active);
        assert_eq!(plan.superseded, 1);
    }

    #[test]
    fn test_plan_keeps_creation_order_and_timestamps() {
        let registry = DefaultRegistry::bundled();
        let rows = vec![
            aged(legacy("passage", "b_key", "newer", None), 1, true),
            aged(legacy("passage", "a_key", "older", None), 9, true),
        ];

        let plan = plan_legacy_migration(&rows, &registry);
        let texts: Vec<_> = plan.upserts.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["older", "newer"]);
        assert_eq!(plan.upserts[0].created_at, Some(rows[1].created_at));
        assert_eq!(plan.upserts[0].updated_at, Some(rows[1].updated_at));
    }
}
