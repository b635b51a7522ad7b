//! Query engine: the context object that owns the index, the classifier and
//! the generator for the lifetime of a process.

use crate::composer::{compose, AnswerEnvelope};
use crate::generator::AnswerGenerator;
use crate::policy::{RiskClassifier, POLICY_VERSION};
use crate::templates::AnswerTemplates;
use healthdesk_core::{AppConfig, AppError, AppResult};
use healthdesk_knowledge::{DocumentSummary, IndexMode, KnowledgeStore, ProviderSource, Retriever};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub const QUERY_REQUIRED: &str = "query is required";
pub const QUERY_TOO_LONG: &str = "query too long";

/// Tunables of the query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Documents retrieved per query
    pub top_k: usize,

    /// Longest accepted query, in characters after trimming
    pub max_query_chars: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_query_chars: 1000,
        }
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_query_chars: config.max_query_chars,
        }
    }
}

/// Health-check view of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    /// An index has been built at least once
    pub ready: bool,
    pub document_count: usize,
    pub retrieval_mode: IndexMode,
    pub policy_version: &'static str,
}

pub struct QueryEngine {
    store: Arc<dyn KnowledgeStore>,
    retriever: Retriever,
    classifier: RiskClassifier,
    templates: AnswerTemplates,
    generator: Arc<dyn AnswerGenerator>,
    options: EngineOptions,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        provider_source: Arc<dyn ProviderSource>,
        generator: Arc<dyn AnswerGenerator>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store,
            retriever: Retriever::new(provider_source),
            classifier: RiskClassifier::default(),
            templates: AnswerTemplates::default(),
            generator,
            options,
        }
    }

    /// Replace the keyword sets.
    pub fn with_classifier(mut self, classifier: RiskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_templates(mut self, templates: AnswerTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Load the knowledge base and build the first index.
    pub async fn initialize(&self) -> AppResult<usize> {
        self.reload().await
    }

    /// Re-read the knowledge base and swap in a freshly built index.
    ///
    /// The reset and rebuild happen in one step through [`Retriever::reload`],
    /// so queries keep using the previous index until the new one is
    /// published. Returns the number of indexed documents.
    pub async fn reload(&self) -> AppResult<usize> {
        let start = Instant::now();
        let documents = self.store.list_documents()?;
        let count = self.retriever.reload(documents).await;

        tracing::info!(
            document_count = count,
            retrieval_mode = %self.retriever.mode(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Knowledge base reloaded"
        );
        Ok(count)
    }

    /// Answer one query.
    ///
    /// Only validation errors are returned; provider and generator failures
    /// are absorbed on the way.
    pub async fn ask(&self, query: &str) -> AppResult<AnswerEnvelope> {
        let query = validate_query(query, self.options.max_query_chars)?;

        let risk = self.classifier.assess(query);
        let forbidden = self.classifier.forbidden(query);
        let documents = self.retriever.retrieve(query, self.options.top_k).await;

        let generated = if forbidden.matched {
            None
        } else {
            self.generator
                .try_generate(query, &documents, risk.level)
                .await
        };

        let envelope = compose(
            &self.templates,
            &risk,
            &forbidden,
            &documents,
            generated.as_deref(),
        );

        tracing::info!(
            query_chars = query.chars().count(),
            risk_level = %envelope.risk_level,
            documents = documents.len(),
            path = ?envelope.path,
            "Answered query"
        );
        tracing::debug!(reasons = ?envelope.reasons, "Risk reasons");

        Ok(envelope)
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            ready: self.retriever.is_ready(),
            document_count: self.retriever.document_count(),
            retrieval_mode: self.retriever.mode(),
            policy_version: POLICY_VERSION,
        }
    }

    /// Documents of the active index, without content.
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.retriever
            .documents()
            .iter()
            .map(|doc| doc.summary())
            .collect()
    }

    pub fn retrieval_mode(&self) -> IndexMode {
        self.retriever.mode()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }
}

/// Trim `query` and check its length.
pub fn validate_query(query: &str, max_chars: usize) -> AppResult<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Validation(QUERY_REQUIRED.to_string()));
    }
    if query.chars().count() > max_chars {
        return Err(AppError::Validation(QUERY_TOO_LONG.to_string()));
    }
    Ok(query)
}
