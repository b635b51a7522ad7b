//! Prompt system for Healthdesk answer generation.
//!
//! This crate provides:
//! - YAML-based prompt definitions with a built-in default
//! - Handlebars template rendering of the system and user messages

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{default_answer_prompt, ANSWER_PROMPT_ID};
pub use loader::{load_prompt, load_prompt_or_default};
pub use types::{
    AnswerPromptContext, BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptDocument,
};
