//! Ask command handler.
//!
//! Answers one query against the workspace knowledge base, exactly as the
//! HTTP API would.

use super::engine_from_config;
use clap::Args;
use healthdesk_core::{config::AppConfig, AppResult};
use healthdesk_triage::AnswerEnvelope;

/// Answer a single query
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Output the answer envelope as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let engine = engine_from_config(config);
        let count = engine.initialize().await?;
        tracing::debug!(
            document_count = count,
            retrieval_mode = %engine.retrieval_mode(),
            generator = engine.generator_name(),
            "Engine ready"
        );

        let envelope = engine.ask(&self.query).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            print!("{}", render(&envelope));
        }

        Ok(())
    }
}

/// Human-readable rendering of an answer.
fn render(envelope: &AnswerEnvelope) -> String {
    let mut out = String::new();
    out.push_str(&envelope.answer);
    out.push_str("\n\n");
    out.push_str(&format!("Risk level: {}\n", envelope.risk_level));
    out.push_str(&format!("Triage: {}\n", envelope.triage_hint));
    out.push_str("\nSources:\n");
    for citation in &envelope.citations {
        if citation.url.is_empty() {
            out.push_str(&format!("- {}\n", citation.title));
        } else {
            out.push_str(&format!("- {} ({})\n", citation.title, citation.url));
        }
    }
    out
}
