//! In-process cache of store-sourced template text.
//!
//! Entries live for the lifetime of the process. There is no expiry: every write
//! path invalidates the addresses it touches. Fills carry a ticket taken before the
//! store read, and a fill is dropped if any invalidation happened in between, so a
//! resolve racing with an update can never re-insert the pre-update text.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::templates::models::TemplateKey;

/// Snapshot of the invalidation counter, taken before reading the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<TemplateKey, String>,
    invalidations: u64,
}

#[derive(Debug, Default)]
pub struct TemplateCache {
    state: RwLock<CacheState>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TemplateKey) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).cloned()
    }

    pub fn ticket(&self) -> FillTicket {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        FillTicket(state.invalidations)
    }

    /// Inserts `text` unless an invalidation happened since `ticket` was taken.
    /// Returns whether the entry was stored.
    pub fn fill(&self, key: TemplateKey, text: String, ticket: FillTicket) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.invalidations != ticket.0 {
            debug!("Dropping stale cache fill for {key}");
            return false;
        }
        state.entries.insert(key, text);
        true
    }

    /// Removes one address. Returns whether an entry was present.
    pub fn invalidate(&self, key: &TemplateKey) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.invalidations += 1;
        state.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.invalidations += 1;
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
