//! Dense embedding index.

use crate::embeddings::EmbeddingProvider;
use crate::types::Document;
use futures::{StreamExt, TryStreamExt};
use healthdesk_core::AppResult;
use std::sync::Arc;

/// Embedding requests in flight while building.
const BUILD_CONCURRENCY: usize = 4;

/// One embedding per document plus the provider that produced them.
#[derive(Debug, Clone)]
pub struct DenseIndex {
    provider: Arc<dyn EmbeddingProvider>,
    vectors: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Embed every document. Fails as a whole if any single embedding fails.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        documents: &[Document],
    ) -> AppResult<Self> {
        let vectors: Vec<Vec<f32>> = {
            let provider = provider.as_ref();
            futures::stream::iter(documents.iter().map(Document::embedding_text))
                .map(|text| async move { provider.embed(&text).await })
                .buffered(BUILD_CONCURRENCY)
                .try_collect()
                .await?
        };

        tracing::debug!(
            documents = vectors.len(),
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Dense index built"
        );

        Ok(Self { provider, vectors })
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Embed the query with the index's provider.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        self.provider.embed(query).await
    }

    /// Similarity of a query vector to every document, in document order.
    pub fn score_all(&self, query: &[f32]) -> Vec<f64> {
        self.vectors.iter().map(|doc| cosine(query, doc)).collect()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Cosine similarity over the common prefix of both vectors.
///
/// Zero-norm input on either side scores 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
