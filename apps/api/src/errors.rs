use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::templates::error::TemplateError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Template(e) => match e {
                TemplateError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND", e.to_string())
                }
                TemplateError::UnknownDefault(_) => {
                    (StatusCode::NOT_FOUND, "UNKNOWN_DEFAULT", e.to_string())
                }
                TemplateError::UnknownPrompt(_) => {
                    (StatusCode::NOT_FOUND, "UNKNOWN_PROMPT", e.to_string())
                }
                TemplateError::AddressConflict(_) => {
                    (StatusCode::CONFLICT, "ADDRESS_CONFLICT", e.to_string())
                }
                TemplateError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                TemplateError::StoreUnavailable { .. } => {
                    tracing::error!("Template store error: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        e.to_string(),
                    )
                }
            },
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
