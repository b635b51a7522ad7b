//! Mode-aware retriever with atomic index replacement.
//!
//! The active index lives behind a single `Arc` snapshot. Queries clone the
//! snapshot and never hold the lock across an await; rebuilds assemble a
//! complete new snapshot first and publish it with one pointer swap. Mode
//! changes publish a new snapshot as well, so a snapshot is never mutated.

use crate::embeddings::ProviderSource;
use crate::retrieval::dense::DenseIndex;
use crate::retrieval::lexical::LexicalIndex;
use crate::retrieval::mode::{IndexMode, ModeEvent};
use crate::types::{Document, ScoredDocument};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Documents and the indexes built over them. Shared across snapshots of
/// the same build.
#[derive(Debug, Default)]
struct CorpusIndex {
    documents: Vec<Document>,
    dense: Option<DenseIndex>,
    lexical: OnceLock<LexicalIndex>,
}

impl CorpusIndex {
    fn lexical(&self) -> &LexicalIndex {
        self.lexical
            .get_or_init(|| LexicalIndex::build(&self.documents))
    }
}

#[derive(Debug)]
struct IndexState {
    mode: IndexMode,
    corpus: Arc<CorpusIndex>,
}

impl IndexState {
    fn unbuilt() -> Self {
        Self {
            mode: IndexMode::Unbuilt,
            corpus: Arc::new(CorpusIndex::default()),
        }
    }
}

/// Ranks documents against a query using the active index mode.
pub struct Retriever {
    provider_source: Arc<dyn ProviderSource>,
    state: RwLock<Arc<IndexState>>,
    ready: AtomicBool,
}

impl Retriever {
    pub fn new(provider_source: Arc<dyn ProviderSource>) -> Self {
        Self {
            provider_source,
            state: RwLock::new(Arc::new(IndexState::unbuilt())),
            ready: AtomicBool::new(false),
        }
    }

    /// Currently active mode.
    pub fn mode(&self) -> IndexMode {
        self.snapshot().mode
    }

    /// True once any build has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn document_count(&self) -> usize {
        self.snapshot().corpus.documents.len()
    }

    /// Documents of the active index, in index order.
    pub fn documents(&self) -> Vec<Document> {
        self.snapshot().corpus.documents.clone()
    }

    /// Drop all index state and return to `Unbuilt`.
    ///
    /// Readers see an empty index until the next build. Reload triggers go
    /// through [`Retriever::reload`] instead, which subsumes the reset.
    pub fn reset(&self) {
        let previous = self.snapshot().mode;
        self.publish(Arc::new(IndexState::unbuilt()));
        log_transition(previous, IndexMode::Unbuilt, ModeEvent::Reset);
    }

    /// Build a new index over `documents` and make it the active one.
    ///
    /// Equivalent to `reset()` followed by a build, except that queries keep
    /// reading the previous index until the new one is complete. The
    /// embedding provider is resolved afresh. Returns the document count.
    pub async fn reload(&self, documents: Vec<Document>) -> usize {
        let previous = self.snapshot().mode;
        let (state, event) = self.build_state(documents).await;
        let count = state.corpus.documents.len();
        let mode = state.mode;

        self.publish(Arc::new(state));
        self.ready.store(true, Ordering::SeqCst);

        if previous != mode {
            log_transition(previous, mode, event);
        }
        info!(document_count = count, retrieval_mode = %mode, "Index built");

        count
    }

    async fn build_state(&self, documents: Vec<Document>) -> (IndexState, ModeEvent) {
        let (dense, event) = match self.provider_source.resolve() {
            None => (None, ModeEvent::NoProvider),
            Some(provider) => match DenseIndex::build(provider, &documents).await {
                Ok(index) => (Some(index), ModeEvent::DenseBuilt),
                Err(e) => {
                    warn!("Dense index build failed, using lexical retrieval: {}", e);
                    (None, ModeEvent::DenseBuildFailed)
                }
            },
        };

        let mode = IndexMode::Unbuilt.transition(event);
        let corpus = CorpusIndex {
            documents,
            dense,
            lexical: OnceLock::new(),
        };
        if mode == IndexMode::Lexical {
            corpus.lexical();
        }

        let state = IndexState {
            mode,
            corpus: Arc::new(corpus),
        };
        (state, event)
    }

    /// Top `k` documents for `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<Document> {
        self.retrieve_scored(query, k)
            .await
            .into_iter()
            .map(|scored| scored.document)
            .collect()
    }

    /// Top `k` documents for `query` with their scores, best first.
    ///
    /// A failed query embedding switches the retriever to lexical mode for
    /// good (until the next reset or reload) and answers this query
    /// lexically.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> Vec<ScoredDocument> {
        let state = self.snapshot();
        let corpus = &state.corpus;
        if corpus.documents.is_empty() || k == 0 {
            return Vec::new();
        }

        let dense = match (state.mode, corpus.dense.as_ref()) {
            (IndexMode::Dense, Some(dense)) => Some(dense),
            _ => None,
        };

        let scores = match dense {
            Some(dense) => match dense.embed_query(query).await {
                Ok(vector) => dense.score_all(&vector),
                Err(e) => {
                    warn!("Query embedding failed, degrading to lexical retrieval: {}", e);
                    self.degrade(&state);
                    corpus.lexical().score_all(query)
                }
            },
            None => corpus.lexical().score_all(query),
        };

        debug!(candidates = scores.len(), k, "Scored documents");
        top_k(&corpus.documents, scores, k)
    }

    fn snapshot(&self) -> Arc<IndexState> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, state: Arc<IndexState>) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = state;
    }

    /// Publish `seen` in lexical mode, unless a rebuild replaced it meanwhile.
    fn degrade(&self, seen: &Arc<IndexState>) {
        let next = seen.mode.transition(ModeEvent::QueryEmbeddingFailed);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !Arc::ptr_eq(&guard, seen) || next == seen.mode {
            return;
        }
        *guard = Arc::new(IndexState {
            mode: next,
            corpus: Arc::clone(&seen.corpus),
        });
        drop(guard);

        log_transition(seen.mode, next, ModeEvent::QueryEmbeddingFailed);
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("mode", &self.mode())
            .field("ready", &self.is_ready())
            .field("document_count", &self.document_count())
            .finish()
    }
}

fn log_transition(from: IndexMode, to: IndexMode, event: ModeEvent) {
    info!(from = %from, to = %to, event = ?event, "Retrieval mode changed");
}

/// Stable descending sort, truncated to `k`.
fn top_k(documents: &[Document], scores: Vec<f64>, k: usize) -> Vec<ScoredDocument> {
    let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(k)
        .map(|(i, score)| ScoredDocument {
            document: documents[i].clone(),
            score,
        })
        .collect()
}
