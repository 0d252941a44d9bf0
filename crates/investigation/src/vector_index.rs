//! Vector index abstraction and an in-memory cosine implementation.
//!
//! The production index is an external similarity-search service. The
//! in-memory [`MemoryIndex`] answers the same queries over a JSON corpus of
//! pre-embedded chunks:
//!
//! ```json
//! [
//!   {
//!     "id": "exchange_logs.txt_chunk_0",
//!     "text": "...",
//!     "metadata": {"file_name": "exchange_logs.txt", "chunk_index": 0, "total_chunks": 4},
//!     "embedding": [0.012, -0.03, ...]
//!   }
//! ]
//! ```

use crate::embeddings::EmbeddingProvider;
use crate::types::CandidateDocument;
use casefile_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Metadata equality filter applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub equals: serde_json::Map<String, serde_json::Value>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `metadata[key] == value`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn matches(&self, metadata: &serde_json::Value) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// Trait for similarity-search backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-k documents by descending similarity, scores in [0, 1].
    async fn similarity_search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> AppResult<Vec<CandidateDocument>>;

    /// Number of documents held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity; zero for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// One pre-embedded chunk of the corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub text: String,

    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Missing vectors can be filled with [`MemoryIndex::embed_missing`]
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Brute-force cosine index held in memory.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    chunks: Vec<IndexedChunk>,
}

impl MemoryIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for chunk in &chunks {
            if !seen.insert(chunk.id.as_str()) {
                return Err(AppError::Index(format!("Duplicate chunk id: {}", chunk.id)));
            }
        }

        Ok(Self { chunks })
    }

    /// Load a corpus file (a JSON array of chunks).
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Index(format!("Failed to read corpus at {:?}: {}", path, e))
        })?;

        let chunks: Vec<IndexedChunk> = serde_json::from_str(&content).map_err(|e| {
            AppError::Index(format!("Failed to parse corpus at {:?}: {}", path, e))
        })?;

        tracing::info!("Loaded {} chunks from {:?}", chunks.len(), path);
        Self::new(chunks)
    }

    /// Embed every chunk that came without a vector.
    pub async fn embed_missing(&mut self, provider: &dyn EmbeddingProvider) -> AppResult<usize> {
        let missing: Vec<usize> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.is_empty())
            .map(|(i, _)| i)
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = missing.iter().map(|&i| self.chunks[i].text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != missing.len() {
            return Err(AppError::Index(format!(
                "Embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                missing.len()
            )));
        }

        for (i, vector) in missing.iter().zip(vectors) {
            self.chunks[*i].embedding = vector;
        }

        tracing::debug!(
            "Embedded {} chunks with {}",
            missing.len(),
            provider.provider_name()
        );
        Ok(missing.len())
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    async fn similarity_search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> AppResult<Vec<CandidateDocument>> {
        let mut scored = Vec::new();

        for chunk in &self.chunks {
            if let Some(filter) = filter {
                if !filter.matches(&chunk.metadata) {
                    continue;
                }
            }

            if chunk.embedding.len() != vector.len() {
                return Err(AppError::Index(format!(
                    "Dimension mismatch for {}: index has {}, query has {}",
                    chunk.id,
                    chunk.embedding.len(),
                    vector.len()
                )));
            }

            let score = cosine_similarity(vector, &chunk.embedding).clamp(0.0, 1.0);
            scored.push((chunk, score));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(chunk, score)| CandidateDocument {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                vector_score: score,
                metadata: chunk.metadata.clone(),
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
