//! Command handlers for the Healthdesk CLI.

pub mod ask;
pub mod kb;
pub mod serve;

pub use ask::AskCommand;
pub use kb::KbCommand;
pub use serve::ServeCommand;

use healthdesk_core::config::AppConfig;
use healthdesk_knowledge::{ConfiguredProviderSource, DirectoryStore};
use healthdesk_triage::{generator_from_config, EngineOptions, QueryEngine};
use std::sync::Arc;

/// Wire a query engine from configuration. The index is not built yet.
pub fn engine_from_config(config: &AppConfig) -> QueryEngine {
    QueryEngine::new(
        Arc::new(DirectoryStore::new(config.resolved_kb_dirs())),
        Arc::new(ConfiguredProviderSource::new(config.clone())),
        generator_from_config(config),
        EngineOptions::from(config),
    )
}
