use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::templates::TemplateService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Template resolution and administration, backed by one shared cache.
    pub templates: TemplateService,
    pub llm: LlmClient,
    pub config: Config,
}
