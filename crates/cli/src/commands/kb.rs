//! Knowledge base inspection commands.

use super::engine_from_config;
use clap::{Args, Subcommand};
use healthdesk_core::{config::AppConfig, AppResult};
use healthdesk_knowledge::{DirectoryStore, DocumentSummary, KnowledgeStore};
use healthdesk_triage::QueryEngine;

/// Inspect the knowledge base
#[derive(Args, Debug)]
pub struct KbCommand {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand, Debug)]
pub enum KbAction {
    /// List loaded documents
    List(KbListCommand),
    /// Build the index and report its state
    Stats(KbStatsCommand),
}

#[derive(Args, Debug)]
pub struct KbListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let documents = load_summaries(config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
        } else if documents.is_empty() {
            println!("No documents found in {:?}", config.resolved_kb_dirs());
        } else {
            for doc in &documents {
                println!("{}\t{}\t{}", doc.id, doc.title, doc.source);
            }
        }

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct KbStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = engine_from_config(config);
        engine.initialize().await?;
        let readiness = engine.readiness();

        if self.json {
            let output = stats_report(&engine, config);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Documents: {}", readiness.document_count);
            println!("  Retrieval mode: {}", readiness.retrieval_mode);
            println!("  Generator: {}", engine.generator_name());
            println!("  Policy version: {}", readiness.policy_version);
            for dir in config.resolved_kb_dirs() {
                println!("  Source: {}", dir.display());
            }
        }

        Ok(())
    }
}

/// Summaries of every document in the configured directories.
fn load_summaries(config: &AppConfig) -> AppResult<Vec<DocumentSummary>> {
    let store = DirectoryStore::new(config.resolved_kb_dirs());
    Ok(store
        .list_documents()?
        .iter()
        .map(|doc| doc.summary())
        .collect())
}

fn stats_report(engine: &QueryEngine, config: &AppConfig) -> serde_json::Value {
    let readiness = engine.readiness();
    serde_json::json!({
        "kbCount": readiness.document_count,
        "retrievalMode": readiness.retrieval_mode,
        "generator": engine.generator_name(),
        "policyVersion": readiness.policy_version,
        "kbDirs": config.resolved_kb_dirs(),
    })
}

impl KbCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KbAction::List(cmd) => cmd.execute(config).await,
            KbAction::Stats(cmd) => cmd.execute(config).await,
        }
    }
}
