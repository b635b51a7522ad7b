//! LLM integration crate for Healthdesk.
//!
//! This crate provides a provider-agnostic abstraction for text completion.
//! The answer generator in `healthdesk-triage` is built on top of it.
//!
//! # Providers
//! - **OpenAI**: Chat Completions API
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use healthdesk_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
