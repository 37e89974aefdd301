use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::export::render_csv;
use crate::templates::manager::InitReport;
use crate::templates::migration::MigrationReport;
use crate::templates::models::{
    ListOrder, Provenance, TemplateChangeRow, TemplateFilter, TemplateKey, TemplateRecord,
};
use crate::templates::substitute::{placeholders, substitute};

#[derive(Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default)]
    pub order: ListOrder,
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<TemplateRecord>>, AppError> {
    let filter = TemplateFilter {
        category: params.category,
        include_inactive: params.include_inactive,
        order: params.order,
    };
    Ok(Json(state.templates.manager().list(&filter).await?))
}

/// GET /api/v1/templates/export
pub async fn handle_export_templates(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.templates.manager().export_all().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prompt_templates.csv\"",
            ),
        ],
        render_csv(&records),
    ))
}

#[derive(Deserialize, Default)]
pub struct InitializeRequest {
    #[serde(default)]
    pub force_reset: bool,
}

/// POST /api/v1/templates/initialize
pub async fn handle_initialize(
    State(state): State<AppState>,
    body: Option<Json<InitializeRequest>>,
) -> Result<Json<InitReport>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    Ok(Json(
        state.templates.manager().initialize(req.force_reset).await?,
    ))
}

/// POST /api/v1/templates/migrate-legacy
pub async fn handle_migrate_legacy(
    State(state): State<AppState>,
) -> Result<Json<MigrationReport>, AppError> {
    Ok(Json(state.templates.manager().migrate_legacy().await?))
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub category: String,
    pub sub_category: String,
    pub key: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub text: String,
    pub provenance: Provenance,
    pub unresolved_placeholders: Vec<String>,
}

/// POST /api/v1/templates/resolve
/// Preview: resolves and substitutes without calling the model.
pub async fn handle_resolve(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, AppError> {
    let key = TemplateKey::new(req.category, req.sub_category, req.key);
    let resolved = state.templates.resolver().resolve(&key).await?;
    let text = substitute(&resolved.text, &req.variables);
    let unresolved_placeholders = placeholders(&resolved.text)
        .into_iter()
        .filter(|name| !req.variables.contains_key(*name))
        .map(str::to_string)
        .collect();
    Ok(Json(ResolveResponse {
        text,
        provenance: resolved.provenance,
        unresolved_placeholders,
    }))
}

#[derive(Deserialize)]
pub struct WipeRequest {
    pub category: Option<String>,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
pub struct WipeResponse {
    pub deleted: u64,
}

/// DELETE /api/v1/templates
pub async fn handle_wipe_templates(
    State(state): State<AppState>,
    Json(req): Json<WipeRequest>,
) -> Result<Json<WipeResponse>, AppError> {
    if !req.confirm {
        return Err(AppError::Validation(
            "refusing to delete templates without \"confirm\": true".to_string(),
        ));
    }
    let deleted = state
        .templates
        .manager()
        .wipe(req.category.as_deref())
        .await?;
    Ok(Json(WipeResponse { deleted }))
}

#[derive(Deserialize)]
pub struct UpdateTemplateRequest {
    pub text: String,
    pub changed_by: String,
    pub change_reason: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateTemplateResponse {
    pub new_version: i32,
}

/// PUT /api/v1/templates/:prompt_id
pub async fn handle_update_template(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<UpdateTemplateResponse>, AppError> {
    let new_version = state
        .templates
        .manager()
        .update_text(
            &prompt_id,
            &req.text,
            &req.changed_by,
            req.change_reason.as_deref(),
        )
        .await?;
    Ok(Json(UpdateTemplateResponse { new_version }))
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub version: i32,
}

/// POST /api/v1/templates/:prompt_id/reset
pub async fn handle_reset_template(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    let record = state.templates.manager().reset_one(&prompt_id).await?;
    Ok(Json(ResetResponse {
        success: true,
        version: record.version,
    }))
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
    pub changed_by: String,
}

/// PATCH /api/v1/templates/:prompt_id/active
pub async fn handle_set_active(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<TemplateRecord>, AppError> {
    let record = state
        .templates
        .manager()
        .set_active(&prompt_id, req.is_active, &req.changed_by)
        .await?;
    Ok(Json(record))
}

/// GET /api/v1/templates/:prompt_id/history
pub async fn handle_template_history(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> Result<Json<Vec<TemplateChangeRow>>, AppError> {
    Ok(Json(state.templates.manager().history(&prompt_id).await?))
}
