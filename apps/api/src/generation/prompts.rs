//! Template addresses and prompt rendering for the generation endpoints.
//!
//! Nothing here holds prompt text. Every prompt comes from the template subsystem,
//! so edits made through the admin API take effect on the next request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::templates::error::TemplateError;
use crate::templates::models::TemplateKey;
use crate::templates::resolver::Resolver;
use crate::templates::substitute::substitute;

/// Placeholder in the question user prompt that receives the per-type instructions.
pub const QUESTION_TYPE_SLOT: &str = "questionTypePrompt";

pub fn passage_system_key() -> TemplateKey {
    TemplateKey::new("passage", "system", "system_base")
}

pub fn passage_user_key() -> TemplateKey {
    TemplateKey::new("passage", "generation", "user_prompt")
}

pub fn question_system_key() -> TemplateKey {
    TemplateKey::new("question", "system", "system_base")
}

pub fn question_user_key() -> TemplateKey {
    TemplateKey::new("question", "generation", "user_prompt")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FillInBlank,
    Vocabulary,
    MainIdea,
    Inference,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
            Self::FillInBlank => "fill_in_blank",
            Self::Vocabulary => "vocabulary",
            Self::MainIdea => "main_idea",
            Self::Inference => "inference",
        }
    }

    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::new("question_type", "instructions", self.as_str())
    }
}

/// A system prompt and user prompt ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Resolves and fills the passage prompts.
pub async fn render_passage_prompt(
    resolver: &Resolver,
    variables: &HashMap<String, String>,
) -> Result<RenderedPrompt, TemplateError> {
    let system = resolver.resolve(&passage_system_key()).await?;
    let user = resolver.resolve(&passage_user_key()).await?;
    Ok(RenderedPrompt {
        system: substitute(&system.text, variables),
        user: substitute(&user.text, variables),
    })
}

/// Resolves and fills the question prompts.
///
/// Two stages: the per-type instructions are spliced into `{questionTypePrompt}`
/// first, then the combined text is filled from `variables`, so placeholders
/// inside the instructions are filled too.
pub async fn render_question_prompt(
    resolver: &Resolver,
    question_type: QuestionType,
    variables: &HashMap<String, String>,
) -> Result<RenderedPrompt, TemplateError> {
    let system = resolver.resolve(&question_system_key()).await?;
    let user = resolver.resolve(&question_user_key()).await?;
    let instructions = resolver.resolve(&question_type.template_key()).await?;

    Ok(RenderedPrompt {
        system: substitute(&system.text, variables),
        user: compose_staged(&user.text, &instructions.text, variables),
    })
}

fn compose_staged(
    user_template: &str,
    instructions: &str,
    variables: &HashMap<String, String>,
) -> String {
    let slot = HashMap::from([(QUESTION_TYPE_SLOT.to_string(), instructions.to_string())]);
    let staged = substitute(user_template, &slot);
    substitute(&staged, variables)
}
