use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Logical address of a template: category → sub-category → key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub category: String,
    pub sub_category: String,
    pub key: String,
}

impl TemplateKey {
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.sub_category, self.key)
    }
}

/// A row of `prompt_templates`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRecord {
    pub prompt_id: String,
    pub category: String,
    pub sub_category: String,
    pub key: String,
    pub text: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl TemplateRecord {
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::new(&self.category, &self.sub_category, &self.key)
    }
}

/// Writable fields of a template row. `prompt_id` is the conflict key.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUpsert {
    pub prompt_id: String,
    pub category: String,
    pub sub_category: String,
    pub key: String,
    pub text: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub version: i32,
    pub changed_by: String,
    /// Original timestamps for rows carried forward from an older generation.
    /// `None` means now. Only applied when the row is created.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TemplateUpsert {
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::new(&self.category, &self.sub_category, &self.key)
    }
}

/// Where a resolved template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Store,
    DefaultFallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::DefaultFallback => "default-fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTemplate {
    pub text: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Creation time ascending.
    #[default]
    Created,
    /// Category, sub-category, then key.
    Name,
}

/// Selection used by administrative listings and bulk wipes.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub category: Option<String>,
    pub include_inactive: bool,
    pub order: ListOrder,
}

impl TemplateFilter {
    /// Every record, active or not, in creation order.
    pub fn everything() -> Self {
        Self {
            category: None,
            include_inactive: true,
            order: ListOrder::Created,
        }
    }

    pub fn matches(&self, record: &TemplateRecord) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| c == record.category);
        category_ok && (self.include_inactive || record.is_active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Update,
    Reset,
    Initialize,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Reset => "reset",
            Self::Initialize => "initialize",
        }
    }
}

/// A text change about to be appended to `prompt_template_history`.
#[derive(Debug, Clone)]
pub struct TemplateChange {
    pub prompt_id: String,
    pub version: i32,
    pub text: String,
    pub kind: ChangeKind,
    pub changed_by: Option<String>,
    pub change_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateChangeRow {
    pub id: i64,
    pub prompt_id: String,
    pub version: i32,
    pub text: String,
    pub change_kind: String,
    pub changed_by: Option<String>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
