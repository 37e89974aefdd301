//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::generation::passage::{generate_passage, PassageRequest, PassageResponse};
use crate::generation::questions::{generate_questions, QuestionRequest, QuestionResponse};
use crate::state::AppState;

/// POST /api/v1/passages/generate
///
/// Resolves the passage templates, fills them from the request and asks the model
/// for a `{title, content}` object.
pub async fn handle_generate_passage(
    State(state): State<AppState>,
    Json(request): Json<PassageRequest>,
) -> Result<Json<PassageResponse>, AppError> {
    let response = generate_passage(&state.templates, &state.llm, &request).await?;
    Ok(Json(response))
}

/// POST /api/v1/questions/generate
///
/// Composes the question prompt with the per-type instructions and asks the model
/// for a JSON array of questions.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    let response = generate_questions(&state.templates, &state.llm, &request).await?;
    Ok(Json(response))
}
