// Passage and question generation.
// Prompts come from the template subsystem; all LLM calls go through llm_client.

pub mod handlers;
pub mod passage;
pub mod prompts;
pub mod questions;
