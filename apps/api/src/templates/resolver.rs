//! Template resolution: cache, then an ordered chain of lookup tiers.
//!
//! The standard chain is the store followed by the bundled defaults. A tier that
//! errors is logged and skipped, so a store outage degrades to the defaults instead
//! of failing the request. Only cacheable tiers (the store) populate the cache; a
//! fallback answer is never cached so the next call retries the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::templates::cache::TemplateCache;
use crate::templates::error::{StoreError, TemplateError};
use crate::templates::models::{Provenance, ResolvedTemplate, TemplateKey};
use crate::templates::registry::DefaultRegistry;
use crate::templates::store::TemplateStore;
use crate::templates::substitute::substitute;

/// One tier of the lookup chain.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn provenance(&self) -> Provenance;

    /// Whether answers from this tier may be cached.
    fn cacheable(&self) -> bool;

    async fn lookup(&self, key: &TemplateKey) -> Result<Option<String>, StoreError>;
}

pub struct StoreSource {
    store: Arc<dyn TemplateStore>,
}

impl StoreSource {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TemplateSource for StoreSource {
    fn name(&self) -> &'static str {
        "store"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Store
    }

    fn cacheable(&self) -> bool {
        true
    }

    async fn lookup(&self, key: &TemplateKey) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(key).await?.map(|record| record.text))
    }
}

pub struct RegistrySource {
    registry: Arc<DefaultRegistry>,
}

impl RegistrySource {
    pub fn new(registry: Arc<DefaultRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl TemplateSource for RegistrySource {
    fn name(&self) -> &'static str {
        "default-registry"
    }

    fn provenance(&self) -> Provenance {
        Provenance::DefaultFallback
    }

    fn cacheable(&self) -> bool {
        false
    }

    async fn lookup(&self, key: &TemplateKey) -> Result<Option<String>, StoreError> {
        Ok(self.registry.find(key).map(|entry| entry.text.to_string()))
    }
}

pub struct Resolver {
    cache: Arc<TemplateCache>,
    chain: Vec<Box<dyn TemplateSource>>,
}

impl Resolver {
    pub fn new(cache: Arc<TemplateCache>, chain: Vec<Box<dyn TemplateSource>>) -> Self {
        Self { cache, chain }
    }

    /// Store first, bundled defaults second.
    pub fn standard(
        cache: Arc<TemplateCache>,
        store: Arc<dyn TemplateStore>,
        registry: Arc<DefaultRegistry>,
    ) -> Self {
        Self::new(
            cache,
            vec![
                Box::new(StoreSource::new(store)),
                Box::new(RegistrySource::new(registry)),
            ],
        )
    }

    pub async fn resolve(&self, key: &TemplateKey) -> Result<ResolvedTemplate, TemplateError> {
        if let Some(text) = self.cache.get(key) {
            debug!("Template cache hit for {key}");
            return Ok(ResolvedTemplate {
                text,
                provenance: Provenance::Store,
            });
        }
        debug!("Template cache miss for {key}");

        for source in &self.chain {
            let ticket = self.cache.ticket();
            match source.lookup(key).await {
                Ok(Some(text)) => {
                    if source.cacheable() {
                        self.cache.fill(key.clone(), text.clone(), ticket);
                    } else {
                        debug!("Resolved {key} from {} (not cached)", source.name());
                    }
                    return Ok(ResolvedTemplate {
                        text,
                        provenance: source.provenance(),
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Template lookup for {key} failed in {}: {e}, falling back",
                        source.name()
                    );
                    continue;
                }
            }
        }

        Err(TemplateError::NotFound(key.clone()))
    }

    pub async fn resolve_and_substitute(
        &self,
        key: &TemplateKey,
        variables: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        let resolved = self.resolve(key).await?;
        Ok(substitute(&resolved.text, variables))
    }
}
