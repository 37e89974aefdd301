//! Comprehension question generation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::{render_question_prompt, QuestionType};
use crate::llm_client::{LlmClient, Model};
use crate::templates::TemplateService;

const DEFAULT_QUESTION_COUNT: u32 = 5;
const MAX_QUESTION_COUNT: u32 = 20;
const DEFAULT_DIFFICULTY: &str = "medium";
const DEFAULT_GRADE_LEVEL: &str = "8";

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub passage_title: String,
    pub passage_text: String,
    pub question_type: QuestionType,
    pub question_count: Option<u32>,
    pub difficulty: Option<String>,
    pub grade_level: Option<String>,
    pub model: Option<Model>,
}

impl QuestionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.passage_text.trim().is_empty() {
            return Err(AppError::Validation(
                "passage_text cannot be empty".to_string(),
            ));
        }
        if let Some(count) = self.question_count {
            if count == 0 || count > MAX_QUESTION_COUNT {
                return Err(AppError::Validation(format!(
                    "question_count must be between 1 and {MAX_QUESTION_COUNT}"
                )));
            }
        }
        Ok(())
    }

    pub fn question_count(&self) -> u32 {
        self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    /// Placeholder values for the question templates, defaults applied.
    pub fn variables(&self) -> HashMap<String, String> {
        HashMap::from([
            ("passageTitle".to_string(), self.passage_title.clone()),
            ("passageText".to_string(), self.passage_text.clone()),
            ("questionCount".to_string(), self.question_count().to_string()),
            (
                "difficulty".to_string(),
                self.difficulty
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            ),
            (
                "gradeLevel".to_string(),
                self.grade_level
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GRADE_LEVEL.to_string()),
            ),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question_type: QuestionType,
    pub questions: Vec<GeneratedQuestion>,
    pub model: Model,
}

pub async fn generate_questions(
    templates: &TemplateService,
    llm: &LlmClient,
    request: &QuestionRequest,
) -> Result<QuestionResponse, AppError> {
    request.validate()?;

    let prompt = render_question_prompt(
        templates.resolver(),
        request.question_type,
        &request.variables(),
    )
    .await?;
    let model = request.model.unwrap_or_else(|| llm.default_model());

    info!(
        "Generating {} {} questions for {:?} (model={model})",
        request.question_count(),
        request.question_type.as_str(),
        request.passage_title
    );
    let questions: Vec<GeneratedQuestion> = llm
        .call_json(model, &prompt.user, &prompt.system)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let questions = keep_well_formed(questions);
    if questions.is_empty() {
        return Err(AppError::Llm(
            "Question generation returned no usable questions".to_string(),
        ));
    }

    Ok(QuestionResponse {
        question_type: request.question_type,
        questions,
        model,
    })
}

/// Drops items with a blank question or answer.
fn keep_well_formed(questions: Vec<GeneratedQuestion>) -> Vec<GeneratedQuestion> {
    let total = questions.len();
    let kept: Vec<_> = questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty() && !q.answer.trim().is_empty())
        .collect();
    if kept.len() < total {
        warn!(
            "Dropped {} malformed questions from model output",
            total - kept.len()
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuestionRequest {
        QuestionRequest {
            passage_title: "Tides".to_string(),
            passage_text: "The moon pulls the sea.".to_string(),
            question_type: QuestionType::Vocabulary,
            question_count: None,
            difficulty: None,
            grade_level: None,
            model: None,
        }
    }

    #[test]
    fn test_variables_apply_defaults() {
        let vars = request().variables();
        assert_eq!(vars["questionCount"], "5");
        assert_eq!(vars["difficulty"], "medium");
        assert_eq!(vars["gradeLevel"], "8");
        assert_eq!(vars["passageTitle"], "Tides");
    }

    #[test]
    fn test_validation() {
        assert!(request().validate().is_ok());

        let mut empty = request();
        empty.passage_text = "\n".to_string();
        assert!(matches!(empty.validate(), Err(AppError::Validation(_))));

        let mut zero = request();
        zero.question_count = Some(0);
        assert!(matches!(zero.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_question_type_deserializes_snake_case() {
        let req: QuestionRequest = serde_json::from_str(
            r#"{"passage_title": "T", "passage_text": "P", "question_type": "fill_in_blank"}"#,
        )
        .unwrap();
        assert_eq!(req.question_type, QuestionType::FillInBlank);
    }

    #[test]
    fn test_keep_well_formed_drops_blank_items() {
        let raw: Vec<GeneratedQuestion> = serde_json::from_str(
            r#"[
                {"question": "What pulls the sea?", "answer": "The moon"},
                {"question": " ", "answer": "x"},
                {"question": "Why?", "answer": ""}
            ]"#,
        )
        .unwrap();
        let kept = keep_well_formed(raw);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].options.is_empty());
    }
}
