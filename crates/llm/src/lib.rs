//! LLM integration crate for casefile.
//!
//! This crate provides a provider-agnostic abstraction for chat completions.
//! The investigation pipeline only ever talks to the `LlmClient` trait, so
//! providers can be swapped (or scripted in tests) without touching it.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Any OpenAI-compatible `/v1/chat/completions` endpoint
//!
//! # Example
//! ```no_run
//! use casefile_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Summarize the wallet activity.", "llama3.2")
//!     .with_system("You are a criminal investigation assistant.")
//!     .with_temperature(0.3);
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
