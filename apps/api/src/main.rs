mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod state;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::registry::DefaultRegistry;
use crate::templates::store::{PgLegacyTemplateSource, PgTemplateStore};
use crate::templates::TemplateService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Console API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Template subsystem: store first, bundled defaults as fallback
    let registry = Arc::new(DefaultRegistry::bundled());
    let templates = TemplateService::new(
        Arc::new(PgTemplateStore::new(db.clone())),
        registry.clone(),
        Some(Arc::new(PgLegacyTemplateSource::new(db))),
        config.template_generation,
    );
    info!(
        "Template service initialized ({} bundled defaults, generation={})",
        registry.len(),
        config.template_generation
    );

    if config.init_templates_on_startup {
        // A failed bootstrap is not fatal: resolution falls back to the bundled defaults.
        match templates.manager().initialize(false).await {
            Ok(report) => info!(
                "Startup template bootstrap wrote {} rows ({} migrated)",
                report.count, report.migrated
            ),
            Err(e) => warn!("Startup template bootstrap failed: {e}"),
        }
    }

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.default_model)?;
    info!("LLM client initialized (default model: {})", config.default_model);

    let state = AppState {
        templates,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
