//! Prompt types for Healthdesk.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// System message template (Handlebars)
    #[serde(default)]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

/// One retrieved document as presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDocument {
    /// 1-based position in the retrieval result
    pub index: usize,
    pub title: String,
    pub url: String,
    pub source: String,
    pub text: String,
}

/// Variables available to the answer prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPromptContext {
    pub query: String,

    /// "low", "medium" or "high"
    pub risk_level: String,

    /// Convenience flag for `{{#if high_risk}}`
    pub high_risk: bool,

    pub documents: Vec<PromptDocument>,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of documents injected into the context
    #[serde(rename = "documentCount")]
    pub document_count: usize,
}
