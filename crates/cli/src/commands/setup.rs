//! Collaborator wiring shared by the commands.

use casefile_core::{config::AppConfig, AppError, AppResult};
use casefile_investigation::{
    create_provider, EmbeddingConfig, EmbeddingProvider, InvestigationConfig, MemoryIndex,
    SearchFilter, VectorIndex,
};
use casefile_llm::{create_client, LlmClient};
use casefile_prompt::PromptLibrary;
use std::path::Path;
use std::sync::Arc;

/// Chat client for the configured provider.
pub fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let endpoint = config.resolve_endpoint(&config.provider);
    let api_key = config.resolve_api_key(&config.provider);

    create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())
        .map_err(AppError::Config)
}

pub fn embedder(
    config: &AppConfig,
    settings: &InvestigationConfig,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let embedding = EmbeddingConfig::from_app(
        config,
        settings.embedding_model(),
        settings.embedding_dimensions,
    );

    let api_key = config.resolve_api_key(&config.embedding_provider);
    let provider = create_provider(&embedding, api_key.as_deref())?;

    tracing::debug!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        dimensions = provider.dimensions(),
        "Embedding provider ready"
    );
    Ok(provider)
}

/// Prompt library with workspace overrides applied.
pub fn prompts(config: &AppConfig) -> AppResult<Arc<PromptLibrary>> {
    Ok(Arc::new(PromptLibrary::load(&config.workspace)?))
}

/// Load the corpus and embed any chunk that ships without a vector.
pub async fn load_index(path: &Path, embedder: &dyn EmbeddingProvider) -> AppResult<MemoryIndex> {
    let mut index = MemoryIndex::load(path)?;
    let embedded = index.embed_missing(embedder).await?;
    if embedded > 0 {
        tracing::info!(embedded, "Embedded chunks without stored vectors");
    }

    tracing::info!(chunks = index.len(), "Corpus loaded from {:?}", path);
    Ok(index)
}

/// Build a metadata filter from `KEY=VALUE` pairs.
///
/// Values that parse as JSON (numbers, booleans) are compared as such,
/// anything else as a string.
pub fn parse_filter(pairs: &[String]) -> AppResult<SearchFilter> {
    let mut filter = SearchFilter::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            AppError::Config(format!("Invalid filter '{}', expected KEY=VALUE", pair))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::Config(format!("Invalid filter '{}', empty key", pair)));
        }

        let value = value.trim();
        let value = serde_json::from_str::<serde_json::Value>(value)
            .ok()
            .filter(|v| v.is_number() || v.is_boolean())
            .unwrap_or_else(|| serde_json::Value::String(value.to_string()));

        filter = filter.with_field(key, value);
    }
    Ok(filter)
}
