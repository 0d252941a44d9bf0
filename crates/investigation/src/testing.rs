//! Scripted collaborators for tests.

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::types::CandidateDocument;
use crate::vector_index::{SearchFilter, VectorIndex};
use casefile_core::{AppError, AppResult};
use casefile_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Chat model that answers by substring match on the user prompt.
///
/// Rules are tried in insertion order; the first needle found in the
/// prompt decides the reply.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    rules: Vec<(String, Result<String, String>)>,
    fallback: Option<String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str, error: &str) -> Self {
        self.rules.push((needle.to_string(), Err(error.to_string())));
        self
    }

    /// Reply used when no rule matches.
    pub fn otherwise(mut self, reply: &str) -> Self {
        self.fallback = Some(reply.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests whose prompt contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.prompt.contains(needle))
            .count()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone().map(Ok))
            .unwrap_or_else(|| Err("no scripted reply".to_string()));

        reply
            .map(|content| LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
            .map_err(AppError::Llm)
    }
}

/// Trigram embedder that counts calls and can fail on chosen texts.
#[derive(Debug)]
pub struct CountingEmbedder {
    inner: TrigramProvider,
    calls: AtomicUsize,
    fail_on: Vec<String>,
}

impl CountingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: TrigramProvider::new(dimensions),
            calls: AtomicUsize::new(0),
            fail_on: Vec::new(),
        }
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(text) = texts
            .iter()
            .find(|t| self.fail_on.iter().any(|needle| t.contains(needle.as_str())))
        {
            return Err(AppError::Embedding(format!("refused to embed: {}", text)));
        }

        self.inner.embed_batch(texts).await
    }
}

/// Index that replays scripted result lists in call order.
///
/// Once the script runs out, every search returns the fallback list
/// truncated to `top_k`.
#[derive(Debug, Default)]
pub struct StaticIndex {
    script: Mutex<VecDeque<Result<Vec<CandidateDocument>, String>>>,
    fallback: Vec<CandidateDocument>,
    top_ks: Mutex<Vec<usize>>,
}

impl StaticIndex {
    pub fn fixed(documents: Vec<CandidateDocument>) -> Self {
        Self {
            fallback: documents,
            ..Default::default()
        }
    }

    pub fn scripted(script: Vec<Result<Vec<CandidateDocument>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// `top_k` of every search so far.
    pub fn top_ks(&self) -> Vec<usize> {
        self.top_ks.lock().unwrap().clone()
    }

    pub fn searches(&self) -> usize {
        self.top_ks.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl VectorIndex for StaticIndex {
    async fn similarity_search(
        &self,
        _vector: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> AppResult<Vec<CandidateDocument>> {
        self.top_ks.lock().unwrap().push(top_k);

        let next = self.script.lock().unwrap().pop_front();
        let documents = match next {
            Some(result) => result.map_err(AppError::Index)?,
            None => self.fallback.iter().take(top_k).cloned().collect(),
        };

        Ok(documents
            .into_iter()
            .filter(|d| filter.map_or(true, |f| f.matches(&d.metadata)))
            .collect())
    }

    fn len(&self) -> usize {
        self.fallback.len()
    }
}

/// Candidate with file metadata derived from the id.
pub fn doc(id: &str, text: &str, score: f32) -> CandidateDocument {
    let file_name = id.split("_chunk_").next().unwrap_or(id);
    CandidateDocument::new(id, text, score)
        .with_metadata(serde_json::json!({ "file_name": file_name }))
}
