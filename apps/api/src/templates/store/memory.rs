//! In-memory `TemplateStore` for tests, mirroring the PostgreSQL semantics.
//! `set_available(false)` simulates an outage: every call fails until restored.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::templates::error::StoreError;
use crate::templates::models::{
    ListOrder, TemplateChange, TemplateChangeRow, TemplateFilter, TemplateKey, TemplateRecord,
    TemplateUpsert,
};
use crate::templates::store::TemplateStore;

#[derive(Default)]
struct MemoryState {
    records: Vec<TemplateRecord>,
    history: Vec<TemplateChangeRow>,
}

pub struct MemoryTemplateStore {
    state: Mutex<MemoryState>,
    available: AtomicBool,
    reads: AtomicUsize,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            available: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
        }
    }
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of address lookups served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<TemplateRecord> {
        self.state.lock().unwrap().records.clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        }
    }
}

fn active_address_taken(records: &[TemplateRecord], key: &TemplateKey, except: &str) -> bool {
    records
        .iter()
        .any(|r| r.is_active && r.prompt_id != except && r.template_key() == *key)
}

fn address_conflict(prompt_id: &str) -> StoreError {
    StoreError::AddressConflict(prompt_id.to_string())
}

fn new_record(record: &TemplateUpsert) -> TemplateRecord {
    let now = Utc::now();
    TemplateRecord {
        prompt_id: record.prompt_id.clone(),
        category: record.category.clone(),
        sub_category: record.sub_category.clone(),
        key: record.key.clone(),
        text: record.text.clone(),
        description: record.description.clone(),
        is_active: record.is_active,
        is_default: record.is_default,
        version: record.version,
        created_at: record.created_at.unwrap_or(now),
        updated_at: record.updated_at.unwrap_or(now),
        created_by: Some(record.changed_by.clone()),
        updated_by: Some(record.changed_by.clone()),
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get(&self, key: &TemplateKey) -> Result<Option<TemplateRecord>, StoreError> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|r| r.is_active && r.template_key() == *key)
            .cloned())
    }

    async fn get_by_prompt_id(
        &self,
        prompt_id: &str,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|r| r.prompt_id == prompt_id)
            .cloned())
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<TemplateRecord>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let mut records: Vec<_> = state
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        match filter.order {
            ListOrder::Created => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ListOrder::Name => records.sort_by(|a, b| {
                (&a.category, &a.sub_category, &a.key).cmp(&(&b.category, &b.sub_category, &b.key))
            }),
        }
        Ok(records)
    }

    async fn upsert(&self, record: &TemplateUpsert) -> Result<TemplateRecord, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let key = record.template_key();
        if record.is_active && active_address_taken(&state.records, &key, &record.prompt_id) {
            return Err(address_conflict(&record.prompt_id));
        }

        match state
            .records
            .iter_mut()
            .find(|r| r.prompt_id == record.prompt_id)
        {
            Some(existing) => {
                existing.version = if existing.text == record.text {
                    existing.version.max(record.version)
                } else {
                    (existing.version + 1).max(record.version)
                };
                existing.category = record.category.clone();
                existing.sub_category = record.sub_category.clone();
                existing.key = record.key.clone();
                existing.text = record.text.clone();
                existing.description = record.description.clone();
                existing.is_active = record.is_active;
                existing.is_default = record.is_default;
                existing.updated_at = Utc::now();
                existing.updated_by = Some(record.changed_by.clone());
                Ok(existing.clone())
            }
            None => {
                let created = new_record(record);
                state.records.push(created.clone());
                Ok(created)
            }
        }
    }

    async fn insert_if_absent(
        &self,
        record: &TemplateUpsert,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let id_taken = state.records.iter().any(|r| r.prompt_id == record.prompt_id);
        let address_taken = record.is_active
            && active_address_taken(&state.records, &record.template_key(), &record.prompt_id);
        if id_taken || address_taken {
            return Ok(None);
        }
        let created = new_record(record);
        state.records.push(created.clone());
        Ok(Some(created))
    }

    async fn update_text(
        &self,
        prompt_id: &str,
        text: &str,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .records
            .iter_mut()
            .find(|r| r.prompt_id == prompt_id)
            .ok_or_else(|| StoreError::MissingRecord(prompt_id.to_string()))?;
        existing.text = text.to_string();
        existing.version += 1;
        existing.updated_at = Utc::now();
        existing.updated_by = Some(changed_by.to_string());
        Ok(existing.clone())
    }

    async fn set_active(
        &self,
        prompt_id: &str,
        is_active: bool,
        changed_by: &str,
    ) -> Result<TemplateRecord, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let key = state
            .records
            .iter()
            .find(|r| r.prompt_id == prompt_id)
            .map(TemplateRecord::template_key)
            .ok_or_else(|| StoreError::MissingRecord(prompt_id.to_string()))?;
        if is_active && active_address_taken(&state.records, &key, prompt_id) {
            return Err(address_conflict(prompt_id));
        }
        let existing = state
            .records
            .iter_mut()
            .find(|r| r.prompt_id == prompt_id)
            .ok_or_else(|| StoreError::MissingRecord(prompt_id.to_string()))?;
        existing.is_active = is_active;
        existing.updated_at = Utc::now();
        existing.updated_by = Some(changed_by.to_string());
        Ok(existing.clone())
    }

    async fn delete_all(&self, filter: &TemplateFilter) -> Result<u64, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| !filter.matches(r));
        Ok((before - state.records.len()) as u64)
    }

    async fn append_history(&self, change: &TemplateChange) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let id = state.history.len() as i64 + 1;
        state.history.push(TemplateChangeRow {
            id,
            prompt_id: change.prompt_id.clone(),
            version: change.version,
            text: change.text.clone(),
            change_kind: change.kind.as_str().to_string(),
            changed_by: change.changed_by.clone(),
            change_reason: change.change_reason.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn history(&self, prompt_id: &str) -> Result<Vec<TemplateChangeRow>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let mut rows: Vec<_> = state
            .history
            .iter()
            .filter(|h| h.prompt_id == prompt_id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| (h.version, h.id));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(prompt_id: &str, sub: &str, key: &str, text: &str) -> TemplateUpsert {
        TemplateUpsert {
            prompt_id: prompt_id.to_string(),
            category: "passage".to_string(),
            sub_category: sub.to_string(),
            key: key.to_string(),
            text: text.to_string(),
            description: None,
            is_active: true,
            is_default: false,
            version: 1,
            changed_by: "tester".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_same_prompt_id_keeps_one_record_with_latest_values() {
        let store = MemoryTemplateStore::new();
        store
            .upsert(&upsert("p1", "system", "system_base", "first"))
            .await
            .unwrap();
        let second = store
            .upsert(&upsert("p1", "generation", "user_prompt", "second"))
            .await
            .unwrap();

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sub_category, "generation");
        assert_eq!(records[0].key, "user_prompt");
        assert_eq!(records[0].text, "second");
        assert_eq!(second.version, 2);
    }

    #[tokio::test]
    async fn test_upsert_with_same_text_keeps_version() {
        let store = MemoryTemplateStore::new();
        store.upsert(&upsert("p1", "s", "k", "same")).await.unwrap();
        let again = store.upsert(&upsert("p1", "s", "k", "same")).await.unwrap();
        assert_eq!(again.version, 1);
    }

    #[tokio::test]
    async fn test_get_skips_inactive_records() {
        let store = MemoryTemplateStore::new();
        store.upsert(&upsert("p1", "s", "k", "text")).await.unwrap();
        store.set_active("p1", false, "tester").await.unwrap();

        let key = TemplateKey::new("passage", "s", "k");
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.get_by_prompt_id("p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_if_absent_skips_existing_prompt_id_and_address() {
        let store = MemoryTemplateStore::new();
        assert!(store
            .insert_if_absent(&upsert("p1", "s", "k", "a"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .insert_if_absent(&upsert("p1", "s", "other", "b"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .insert_if_absent(&upsert("p2", "s", "k", "c"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_outage_fails_every_call() {
        let store = MemoryTemplateStore::new();
        store.set_available(false);
        let key = TemplateKey::new("passage", "s", "k");
        assert!(matches!(
            store.get(&key).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.upsert(&upsert("p1", "s", "k", "a")).await.is_err());
        store.set_available(true);
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders() {
        let store = MemoryTemplateStore::new();
        store.upsert(&upsert("p1", "b", "k", "1")).await.unwrap();
        store.upsert(&upsert("p2", "a", "k", "2")).await.unwrap();

        let created = store.list(&TemplateFilter::everything()).await.unwrap();
        assert_eq!(created[0].prompt_id, "p1");

        let by_name = store
            .list(&TemplateFilter {
                order: ListOrder::Name,
                ..TemplateFilter::everything()
            })
            .await
            .unwrap();
        assert_eq!(by_name[0].prompt_id, "p2");
    }
}
