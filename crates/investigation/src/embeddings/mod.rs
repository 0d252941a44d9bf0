//! Embedding providers.
//!
//! Text goes in, a fixed-width vector comes out. The retrieval stage only
//! sees the [`EmbeddingProvider`] trait.

pub mod providers;

use casefile_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Which embedding provider to build, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "openai", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom API base URL
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Embedding settings for the application's active embedding provider.
    pub fn from_app(app: &AppConfig, model: &str, dimensions: Option<usize>) -> Self {
        let provider = app.embedding_provider.clone();
        let model = if provider == "trigram" {
            "trigram-v1".to_string()
        } else {
            model.to_string()
        };
        let dimensions = dimensions.unwrap_or_else(|| default_dimensions(&model));

        Self {
            endpoint: app.resolve_endpoint(&provider),
            provider,
            model,
            dimensions,
        }
    }
}

/// Known output widths of common embedding models.
pub fn default_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-ada-002" | "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        "nomic-embed-text" => 768,
        "mxbai-embed-large" => 1024,
        "all-minilm" => 384,
        _ => 384,
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(providers::TrigramProvider::new(config.dimensions))),

        "ollama" => Ok(Arc::new(providers::OllamaProvider::new(config)?)),

        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Embedding("OpenAI embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(providers::OpenAiProvider::new(config, api_key)?))
        }

        _ => Err(AppError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, openai, ollama",
            config.provider
        ))),
    }
}
