//! Prompt template resolution and versioning.
//!
//! Templates live in the `prompt_templates` table, addressed by
//! `(category, sub_category, key)` and identified by `prompt_id`. Reads go through
//! [`resolver::Resolver`]: in-process cache, then the store, then the bundled
//! [`registry::DefaultRegistry`]. Writes go through [`manager::TemplateManager`],
//! which invalidates the shared cache on every mutation.

pub mod cache;
pub mod defaults;
pub mod error;
pub mod export;
pub mod handlers;
pub mod manager;
pub mod migration;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod substitute;

use std::sync::Arc;

use crate::templates::cache::TemplateCache;
use crate::templates::manager::TemplateManager;
use crate::templates::migration::{LegacyTemplateSource, SchemaGeneration};
use crate::templates::registry::DefaultRegistry;
use crate::templates::resolver::Resolver;
use crate::templates::store::TemplateStore;

/// Read and write halves of the template subsystem, sharing one cache.
#[derive(Clone)]
pub struct TemplateService {
    resolver: Arc<Resolver>,
    manager: Arc<TemplateManager>,
}

impl TemplateService {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        registry: Arc<DefaultRegistry>,
        legacy: Option<Arc<dyn LegacyTemplateSource>>,
        generation: SchemaGeneration,
    ) -> Self {
        let cache = Arc::new(TemplateCache::new());
        let resolver = Resolver::standard(cache.clone(), store.clone(), registry.clone());
        let manager = TemplateManager::new(store, registry, cache, legacy, generation);
        Self {
            resolver: Arc::new(resolver),
            manager: Arc::new(manager),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn manager(&self) -> &TemplateManager {
        &self.manager
    }
}
