//! LLM reranking and score fusion.

use crate::chat::PromptRunner;
use crate::types::{CandidateDocument, ConfidenceLabel, RankedDocument};
use casefile_prompt::builtin::RERANK;
use futures::future::join_all;
use tracing::instrument;

/// Weight of the vector similarity in the combined score.
pub const VECTOR_WEIGHT: f32 = 0.4;

/// Weight of the LLM relevance rating in the combined score.
pub const RELEVANCE_WEIGHT: f32 = 0.6;

pub fn combine_scores(vector_score: f32, relevance_score: f32) -> f32 {
    VECTOR_WEIGHT * vector_score + RELEVANCE_WEIGHT * relevance_score
}

/// Read a 0-100 rating out of the model's reply, scaled to [0, 1].
///
/// All ASCII digits are concatenated; no digits means 0.
pub fn parse_rating(response: &str) -> f32 {
    let digits: String = response.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0.0;
    }

    // Anything too long for u64 is far above 100 anyway
    let value = digits.parse::<u64>().unwrap_or(u64::MAX).min(100);
    value as f32 / 100.0
}

/// Reorders retrieved candidates by fused vector and LLM relevance.
#[derive(Debug, Clone)]
pub struct Reranker {
    runner: PromptRunner,
    batch_size: usize,
    top_n: usize,
}

impl Reranker {
    pub fn new(runner: PromptRunner, batch_size: usize, top_n: usize) -> Self {
        Self {
            runner,
            batch_size: batch_size.max(1),
            top_n,
        }
    }

    /// Rate every document, sort by combined score, keep the best `top_n`.
    #[instrument(skip(self, documents), fields(candidates = documents.len(), top_n = self.top_n))]
    pub async fn rerank(&self, query: &str, documents: Vec<CandidateDocument>) -> Vec<RankedDocument> {
        if documents.is_empty() {
            return Vec::new();
        }

        let mut ranked = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.batch_size) {
            let ratings = join_all(batch.iter().map(|doc| self.rate(query, doc))).await;

            for (document, relevance_score) in batch.iter().zip(ratings) {
                let combined_score = combine_scores(document.vector_score, relevance_score);
                ranked.push(RankedDocument {
                    document: document.clone(),
                    relevance_score,
                    combined_score,
                    confidence: ConfidenceLabel::from_score(combined_score),
                });
            }
        }

        ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        ranked.truncate(self.top_n);

        tracing::info!(kept = ranked.len(), "Reranking complete");
        ranked
    }

    /// Relevance of one document; falls back to its vector score on error.
    async fn rate(&self, query: &str, document: &CandidateDocument) -> f32 {
        match self
            .runner
            .run(RERANK, [("query", query), ("document", document.text.as_str())])
            .await
        {
            Ok(response) => parse_rating(&response),
            Err(e) => {
                tracing::warn!(
                    document = %document.id,
                    "Rating failed, using vector score: {}",
                    e
                );
                document.vector_score
            }
        }
    }
}
