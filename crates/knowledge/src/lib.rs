//! Knowledge base and retrieval for Healthdesk.
//!
//! Documents come from a [`KnowledgeStore`]; a [`Retriever`] ranks them for a
//! query with dense embeddings when a provider is available, or with a
//! character-bigram TF-IDF index otherwise.

pub mod embeddings;
pub mod parser;
pub mod retrieval;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use embeddings::{
    ConfiguredProviderSource, EmbeddingProvider, FixedProviderSource, MockProvider,
    ProviderSource,
};
pub use retrieval::{IndexMode, ModeEvent, Retriever};
pub use store::{DirectoryStore, InMemoryStore, KnowledgeStore};
pub use types::{Document, DocumentSummary, ScoredDocument};
