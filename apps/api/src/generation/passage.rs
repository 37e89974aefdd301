//! Reading passage generation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::render_passage_prompt;
use crate::llm_client::{LlmClient, Model};
use crate::templates::TemplateService;

const DEFAULT_WORD_COUNT: u32 = 300;
const MAX_WORD_COUNT: u32 = 2000;
const DEFAULT_DIFFICULTY: &str = "medium";
const DEFAULT_PASSAGE_TYPE: &str = "informational";

#[derive(Debug, Clone, Deserialize)]
pub struct PassageRequest {
    pub topic: String,
    pub grade_level: String,
    pub word_count: Option<u32>,
    pub difficulty: Option<String>,
    pub passage_type: Option<String>,
    pub additional_instructions: Option<String>,
    pub model: Option<Model>,
}

impl PassageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("topic cannot be empty".to_string()));
        }
        if self.grade_level.trim().is_empty() {
            return Err(AppError::Validation(
                "grade_level cannot be empty".to_string(),
            ));
        }
        if let Some(count) = self.word_count {
            if count == 0 || count > MAX_WORD_COUNT {
                return Err(AppError::Validation(format!(
                    "word_count must be between 1 and {MAX_WORD_COUNT}"
                )));
            }
        }
        Ok(())
    }

    /// Placeholder values for the passage templates, defaults applied.
    pub fn variables(&self) -> HashMap<String, String> {
        HashMap::from([
            ("topic".to_string(), self.topic.trim().to_string()),
            ("gradeLevel".to_string(), self.grade_level.trim().to_string()),
            (
                "wordCount".to_string(),
                self.word_count.unwrap_or(DEFAULT_WORD_COUNT).to_string(),
            ),
            (
                "difficulty".to_string(),
                self.difficulty
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            ),
            (
                "passageType".to_string(),
                self.passage_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PASSAGE_TYPE.to_string()),
            ),
            (
                "additionalInstructions".to_string(),
                self.additional_instructions
                    .clone()
                    .unwrap_or_else(|| "None.".to_string()),
            ),
        ])
    }
}

/// Shape the passage user prompt asks the model to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPassage {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PassageResponse {
    pub title: String,
    pub content: String,
    pub word_count: usize,
    pub model: Model,
}

pub async fn generate_passage(
    templates: &TemplateService,
    llm: &LlmClient,
    request: &PassageRequest,
) -> Result<PassageResponse, AppError> {
    request.validate()?;

    let prompt = render_passage_prompt(templates.resolver(), &request.variables()).await?;
    let model = request.model.unwrap_or_else(|| llm.default_model());

    info!(
        "Generating passage: topic={:?}, grade={}, model={model}",
        request.topic, request.grade_level
    );
    let passage: GeneratedPassage = llm
        .call_json(model, &prompt.user, &prompt.system)
        .await
        .map_err(|e| AppError::Llm(format!("Passage generation failed: {e}")))?;

    if passage.content.trim().is_empty() {
        return Err(AppError::Llm(
            "Passage generation returned empty content".to_string(),
        ));
    }

    let word_count = passage.content.split_whitespace().count();
    info!("Passage generated: {:?} ({word_count} words)", passage.title);

    Ok(PassageResponse {
        title: passage.title,
        content: passage.content,
        word_count,
        model,
    })
}
