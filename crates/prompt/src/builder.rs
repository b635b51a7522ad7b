//! Prompt builder for rendering templates.

use crate::types::{AnswerPromptContext, BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use healthdesk_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Build a prompt from a definition and the answer context.
///
/// Both the system and the user template are rendered with Handlebars
/// against the same context. HTML escaping is disabled.
///
/// # Example
/// ```no_run
/// use healthdesk_prompt::{build_prompt, default_answer_prompt, AnswerPromptContext};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let context = AnswerPromptContext {
///     query: "熱中症の対策は？".to_string(),
///     risk_level: "low".to_string(),
///     high_risk: false,
///     documents: Vec::new(),
/// };
/// let built = build_prompt(&default_answer_prompt(), &context)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    context: &AnswerPromptContext,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = match definition.system {
        Some(ref template) => Some(render_template(template, context)?),
        None => None,
    };
    let user = render_template(&definition.template, context)?;

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            document_count: context.documents.len(),
        },
    })
}

/// Render a Handlebars template with a serializable context.
fn render_template<T: Serialize>(template: &str, data: &T) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
