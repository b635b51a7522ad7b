//! Optional free-text answer generation.
//!
//! A generator never fails from the caller's point of view: any problem
//! (missing configuration, provider error, empty output) is `None` and the
//! composer moves on to its deterministic branches.

use crate::policy::RiskLevel;
use healthdesk_core::AppConfig;
use healthdesk_knowledge::Document;
use healthdesk_llm::{create_client, LlmClient, LlmRequest};
use healthdesk_prompt::{
    build_prompt, load_prompt_or_default, AnswerPromptContext, PromptDefinition, PromptDocument,
};
use std::sync::Arc;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 500;

#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn try_generate(
        &self,
        query: &str,
        documents: &[Document],
        risk: RiskLevel,
    ) -> Option<String>;
}

/// Used when no generator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl AnswerGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn try_generate(&self, _: &str, _: &[Document], _: RiskLevel) -> Option<String> {
        None
    }
}

/// Generates answers with an LLM from a rendered prompt.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LlmGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }

    fn request(
        &self,
        query: &str,
        documents: &[Document],
        risk: RiskLevel,
    ) -> healthdesk_core::AppResult<LlmRequest> {
        let context = AnswerPromptContext {
            query: query.to_string(),
            risk_level: risk.as_str().to_string(),
            high_risk: risk == RiskLevel::High,
            documents: documents
                .iter()
                .enumerate()
                .map(|(i, doc)| PromptDocument {
                    index: i + 1,
                    title: doc.title.clone(),
                    url: doc.url.clone(),
                    source: doc.source.clone(),
                    text: doc.content.clone(),
                })
                .collect(),
        };
        let built = build_prompt(&self.prompt, &context)?;

        let mut request = LlmRequest::new(built.user, self.model.clone())
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for LlmGenerator {
    fn name(&self) -> &str {
        self.client.provider_name()
    }

    async fn try_generate(
        &self,
        query: &str,
        documents: &[Document],
        risk: RiskLevel,
    ) -> Option<String> {
        let request = match self.request(query, documents, risk) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "llm_answer_failed");
                return None;
            }
        };

        match self.client.complete(&request).await {
            Ok(response) => {
                let text = response.content.trim();
                if text.is_empty() {
                    tracing::warn!(provider = self.client.provider_name(), "llm_answer_empty");
                    None
                } else {
                    tracing::debug!(
                        provider = self.client.provider_name(),
                        total_tokens = response.usage.total_tokens,
                        "Generated answer"
                    );
                    Some(text.to_string())
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm_answer_failed");
                None
            }
        }
    }
}

/// Build the configured generator, or a disabled one.
///
/// Configuration problems are logged and disable generation rather than
/// failing startup.
pub fn generator_from_config(config: &AppConfig) -> Arc<dyn AnswerGenerator> {
    let settings = match config.generator_settings() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            tracing::info!("No answer generator configured; using document summaries");
            return Arc::new(DisabledGenerator);
        }
        Err(e) => {
            tracing::warn!("Answer generator disabled: {}", e);
            return Arc::new(DisabledGenerator);
        }
    };

    let client = match create_client(
        &settings.provider,
        settings.endpoint.as_deref(),
        settings.api_key.as_deref(),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Answer generator disabled: {}", e);
            return Arc::new(DisabledGenerator);
        }
    };

    let prompt = match load_prompt_or_default(&config.workspace) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::warn!("Answer generator disabled: {}", e);
            return Arc::new(DisabledGenerator);
        }
    };

    tracing::info!(
        provider = %settings.provider,
        model = %settings.model,
        prompt = %prompt.id,
        "Answer generator enabled"
    );
    Arc::new(LlmGenerator::new(client, settings.model, prompt))
}
