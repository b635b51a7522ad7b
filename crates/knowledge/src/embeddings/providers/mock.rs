//! Mock embedding provider using hashed character bigrams.

use crate::embeddings::provider::EmbeddingProvider;
use healthdesk_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock provider for testing and offline demos.
///
/// Generates deterministic, content-dependent vectors by hashing the
/// character bigrams of the lowercased text into a fixed number of
/// dimensions. Works for scripts without word boundaries, which matters
/// for Japanese knowledge bases.
///
/// Failures can be injected: [`MockProvider::failing_on`] rejects any text
/// containing a marker, [`MockProvider::always_failing`] rejects everything.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    fail_on: Option<String>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            fail_on: None,
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every request whose text contains `marker`.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    /// Fail every request.
    pub fn always_failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Number of embed requests received so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn generate_mock_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let chars: Vec<char> = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        for window in chars.windows(2) {
            let hash = window
                .iter()
                .fold(0u64, |acc, c| acc.wrapping_mul(37).wrapping_add(*c as u64));
            embedding[(hash as usize) % self.dimensions] += 1.0;
        }

        if chars.len() == 1 {
            embedding[(chars[0] as usize) % self.dimensions] += 1.0;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "bigram-hash-v1"
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let injected = self.fail_all
            || self
                .fail_on
                .as_deref()
                .is_some_and(|marker| text.contains(marker));
        if injected {
            return Err(AppError::Retrieval(
                "mock embedding failure (injected)".to_string(),
            ));
        }

        Ok(self.generate_mock_embedding(text))
    }
}
