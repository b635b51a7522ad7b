//! Embedding provider trait, factory and provider resolution.

use crate::embeddings::providers::{
    mock::MockProvider, ollama::OllamaEmbeddingProvider, openai::OpenAiEmbeddingProvider,
};
use healthdesk_core::config::{AppConfig, EmbeddingSettings};
use healthdesk_core::AppResult;
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate the embedding for one text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider from resolved settings.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match settings {
        EmbeddingSettings::OpenAI {
            endpoint,
            model,
            api_key,
        } => Arc::new(OpenAiEmbeddingProvider::new(endpoint, model, api_key)?),
        EmbeddingSettings::Ollama { endpoint, model } => {
            Arc::new(OllamaEmbeddingProvider::new(endpoint, model)?)
        }
        EmbeddingSettings::Mock {
            dimensions,
            fail_on,
        } => {
            let mut mock = MockProvider::new(*dimensions);
            if let Some(marker) = fail_on {
                mock = mock.failing_on(marker.clone());
            }
            Arc::new(mock)
        }
    };

    Ok(provider)
}

/// Decides which embedding provider, if any, the next index build uses.
///
/// Consulted once per reset/reload, never per query.
pub trait ProviderSource: Send + Sync {
    fn resolve(&self) -> Option<Arc<dyn EmbeddingProvider>>;
}

/// Always resolves to the same provider (or to none).
#[derive(Debug, Clone, Default)]
pub struct FixedProviderSource {
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl FixedProviderSource {
    pub fn new(provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { provider }
    }

    /// Lexical-only retrieval.
    pub fn none() -> Self {
        Self { provider: None }
    }
}

impl ProviderSource for FixedProviderSource {
    fn resolve(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        self.provider.clone()
    }
}

/// Re-reads the application configuration on every resolve.
#[derive(Debug, Clone)]
pub struct ConfiguredProviderSource {
    config: AppConfig,
}

impl ConfiguredProviderSource {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl ProviderSource for ConfiguredProviderSource {
    fn resolve(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        let settings = self
            .config
            .refreshed()
            .and_then(|config| config.embedding_settings());

        match settings {
            Ok(Some(settings)) => match create_provider(&settings) {
                Ok(provider) => {
                    tracing::debug!(
                        provider = provider.provider_name(),
                        model = provider.model_name(),
                        "Embedding provider resolved"
                    );
                    Some(provider)
                }
                Err(e) => {
                    tracing::warn!("Embedding provider unavailable: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read embedding configuration: {}", e);
                None
            }
        }
    }
}
