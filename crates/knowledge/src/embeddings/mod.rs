//! Embedding providers for dense retrieval.
//!
//! A provider turns one text into one vector. Providers perform a single
//! request per call; the retriever decides what a failure means.

pub mod provider;
pub mod providers;

pub use provider::{
    create_provider, ConfiguredProviderSource, EmbeddingProvider, FixedProviderSource,
    ProviderSource,
};
pub use providers::mock::MockProvider;
