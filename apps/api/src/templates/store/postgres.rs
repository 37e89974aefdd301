//! PostgreSQL-backed template store.
//!
//! Runtime-checked queries (`sqlx::query_as`, not `query_as!`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::templates::error::StoreError;
use crate::templates::migration::{LegacyPromptRow, LegacyTemplateSource};
use crate::templates::models::{
    ListOrder, TemplateChange, TemplateChangeRow, TemplateFilter, TemplateKey, TemplateRecord,
    TemplateUpsert,
};
use crate::templates::store::TemplateStore;

const ACTIVE_ADDRESS_INDEX: &str = "prompt_templates_active_address";

const RECORD_COLUMNS: &str = "prompt_id, category, sub_category, key, text, description, \
     is_active, is_default, version, created_at, updated_at, created_by, updated_by";

#[derive(Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation on the active-address index to `AddressConflict`.
fn write_error(e: sqlx::Error, prompt_id: &str) -> StoreError {
    let conflict = e.as_database_error().is_some_and(|db| {
        db.is_unique_violation() && db.constraint() == Some(ACTIVE_ADDRESS_INDEX)
    });
    if conflict {
        StoreError::AddressConflict(prompt_id.to_string())
    } else {
        StoreError::Database(e)
    }
}

fn order_clause(order: ListOrder) -> &'static str {
    match order {
        ListOrder::Created => "ORDER BY created_at ASC, prompt_id ASC",
        ListOrder::Name => "ORDER BY category ASC, sub_category ASC, key ASC",
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn get(&self, key: &TemplateKey) -> Result<Option<TemplateRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_templates \
             WHERE category = $1 AND sub_category = $2 AND key = $3 AND is_active \
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(&key.category)
            .bind(&key.sub_category)
            .bind(&key.key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_prompt_id(
        &self,
        prompt_id: &str,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM prompt_templates WHERE prompt_id = $1");
        Ok(sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(prompt_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<TemplateRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_templates \
             WHERE ($1::text IS NULL OR category = $1) AND ($2 OR is_active) {}",
            order_clause(filter.order)
        );
        Ok(sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(filter.category.as_deref())
            .bind(filter.include_inactive)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn upsert(&self, record: &TemplateUpsert) -> Result<TemplateRecord, StoreError> {
        let query = format!(
            r#"
            INSERT INTO prompt_templates
                (prompt_id, category, sub_category, key, text, description,
                 is_active, is_default, version, created_by, updated_by,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10,
                    COALESCE($11, now()), COALESCE($12, now()))
            ON CONFLICT (prompt_id) DO UPDATE SET
                category = EXCLUDED.category,
                sub_category = EXCLUDED.sub_category,
                key = EXCLUDED.key,
                text = EXCLUDED.text,
                description = EXCLUDED.description,
                is_active = EXCLUDED.is_active,
                is_default = EXCLUDED.is_default,
                version = CASE
                    WHEN prompt_templates.text = EXCLUDED.text
                        THEN GREATEST(prompt_templates.version, EXCLUDED.version)
                    ELSE GREATEST(prompt_templates.version + 1, EXCLUDED.version)
                END,
                updated_at = now(),
                updated_by = EXCLUDED.updated_by
            RETURNING {RECORD_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(&record.prompt_id)
            .bind(&record.category)
            .bind(&record.sub_category)
            .bind(&record.key)
            .bind(&record.text)
            .bind(record.description.as_deref())
            .bind(record.is_active)
            .bind(record.is_default)
            .bind(record.version)
            .bind(&record.changed_by)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, &record.prompt_id))
    }

    async fn insert_if_absent(
        &self,
        record: &TemplateUpsert,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        // No conflict target: skips on the prompt_id key and on the active-address index.
        let query = format!(
            r#"
            INSERT INTO prompt_templates
                (prompt_id, category, sub_category, key, text, description,
                 is_active, is_default, version, created_by, updated_by,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10,
                    COALESCE($11, now()), COALESCE($12, now()))
            ON CONFLICT DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(&record.prompt_id)
            .bind(&record.category)
            .bind(&record.sub_category)
            .bind(&record.key)
            .bind(&record.text)
            .bind(record.description.as_deref())
            .bind(record.is_active)
            .bind(record.is_default)
            .bind(record.version)
            .bind(&record.changed_by)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_text(
        &self,
        prompt_id: &str,
        text: &str,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError> {
        let query = format!(
            "UPDATE prompt_templates \
             SET text = $2, version = version + 1, updated_at = now(), updated_by = $3 \
             WHERE prompt_id = $1 \
             RETURNING {RECORD_COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(prompt_id)
            .bind(text)
            .bind(changed_by)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::MissingRecord(prompt_id.to_string()))
    }

    async fn set_active(
        &self,
        prompt_id: &str,
        is_active: bool,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError> {
        let query = format!(
            "UPDATE prompt_templates \
             SET is_active = $2, updated_at = now(), updated_by = $3 \
             WHERE prompt_id = $1 \
             RETURNING {RECORD_COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRecord>(&query)
            .bind(prompt_id)
            .bind(is_active)
            .bind(changed_by)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, prompt_id))?
            .ok_or_else(|| StoreError::MissingRecord(prompt_id.to_string()))
    }

    async fn delete_all(&self, filter: &TemplateFilter) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM prompt_templates \
             WHERE ($1::text IS NULL OR category = $1) AND ($2 OR is_active)",
        )
        .bind(filter.category.as_deref())
        .bind(filter.include_inactive)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn append_history(&self, change: &TemplateChange) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO prompt_template_history
                (prompt_id, version, text, change_kind, changed_by, change_reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&change.prompt_id)
        .bind(change.version)
        .bind(&change.text)
        .bind(change.kind.as_str())
        .bind(change.changed_by.as_deref())
        .bind(change.change_reason.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(&self, prompt_id: &str) -> Result<Vec<TemplateChangeRow>, StoreError> {
        Ok(sqlx::query_as::<_, TemplateChangeRow>(
            r#"
            SELECT id, prompt_id, version, text, change_kind, changed_by, change_reason, created_at
            FROM prompt_template_history
            WHERE prompt_id = $1
            ORDER BY version ASC, id ASC
            "#,
        )
        .bind(prompt_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

/// Reads the legacy `prompts` table. Never writes to it.
#[derive(Clone)]
pub struct PgLegacyTemplateSource {
    pool: PgPool,
}

impl PgLegacyTemplateSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacyTemplateSource for PgLegacyTemplateSource {
    async fn fetch_all(&self) -> Result<Vec<LegacyPromptRow>, StoreError> {
        Ok(sqlx::query_as::<_, LegacyPromptRow>(
            r#"
            SELECT id, category, prompt_key, prompt_text, is_active, version,
                   created_at, updated_at
            FROM prompts
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
