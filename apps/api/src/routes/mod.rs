pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template administration
        .route(
            "/api/v1/templates",
            get(templates::handle_list_templates).delete(templates::handle_wipe_templates),
        )
        .route(
            "/api/v1/templates/export",
            get(templates::handle_export_templates),
        )
        .route(
            "/api/v1/templates/initialize",
            post(templates::handle_initialize),
        )
        .route(
            "/api/v1/templates/migrate-legacy",
            post(templates::handle_migrate_legacy),
        )
        .route("/api/v1/templates/resolve", post(templates::handle_resolve))
        .route(
            "/api/v1/templates/:prompt_id",
            put(templates::handle_update_template),
        )
        .route(
            "/api/v1/templates/:prompt_id/reset",
            post(templates::handle_reset_template),
        )
        .route(
            "/api/v1/templates/:prompt_id/active",
            patch(templates::handle_set_active),
        )
        .route(
            "/api/v1/templates/:prompt_id/history",
            get(templates::handle_template_history),
        )
        // Generation
        .route(
            "/api/v1/passages/generate",
            post(generation::handle_generate_passage),
        )
        .route(
            "/api/v1/questions/generate",
            post(generation::handle_generate_questions),
        )
        .with_state(state)
}
