//! Retrieval orchestration: single search or expanded multi-search with merge.

use crate::config::SubqueryFailurePolicy;
use crate::embeddings::EmbeddingProvider;
use crate::expander::QueryExpander;
use crate::timeout::with_timeout;
use crate::types::{CandidateDocument, RetrievalResult, RetrievalStrategy};
use crate::vector_index::{SearchFilter, VectorIndex};
use casefile_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Results fetched per sub-query: `ceil(top_k / queries) + 1`.
pub fn per_query_k(top_k: usize, queries: usize) -> usize {
    top_k.div_ceil(queries.max(1)) + 1
}

/// Merge per-query result lists.
///
/// Duplicate ids keep the occurrence with the higher `vector_score`. The
/// result is sorted by descending score; equal scores keep first-seen order.
pub fn merge_candidates<I>(batches: I, top_k: usize) -> Vec<CandidateDocument>
where
    I: IntoIterator<Item = Vec<CandidateDocument>>,
{
    let mut merged: Vec<CandidateDocument> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for document in batches.into_iter().flatten() {
        match positions.get(&document.id) {
            Some(&pos) => {
                if document.vector_score > merged[pos].vector_score {
                    merged[pos] = document;
                }
            }
            None => {
                positions.insert(document.id.clone(), merged.len());
                merged.push(document);
            }
        }
    }

    merged.sort_by(|a, b| b.vector_score.total_cmp(&a.vector_score));
    merged.truncate(top_k);
    merged
}

/// Fetches candidate evidence for a query.
pub struct RetrievalOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    expander: QueryExpander,
    top_k: usize,
    failure_policy: SubqueryFailurePolicy,
    call_timeout: Duration,
    filter: Option<SearchFilter>,
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        expander: QueryExpander,
        top_k: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            expander,
            top_k: top_k.max(1),
            failure_policy: SubqueryFailurePolicy::default(),
            call_timeout,
            filter: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: SubqueryFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Restrict every search to documents whose metadata matches.
    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn retrieve(
        &self,
        query: &str,
        strategy: RetrievalStrategy,
    ) -> AppResult<RetrievalResult> {
        match strategy {
            RetrievalStrategy::SingleStep => {
                let documents = self.search(query, self.top_k).await?;
                tracing::info!(count = documents.len(), "Single-step retrieval complete");

                Ok(RetrievalResult {
                    documents,
                    strategy,
                    expanded_queries: None,
                })
            }
            RetrievalStrategy::MultiStep => self.retrieve_expanded(query).await,
        }
    }

    async fn retrieve_expanded(&self, query: &str) -> AppResult<RetrievalResult> {
        let queries = self.expander.expand(query).await;
        let k = per_query_k(self.top_k, queries.len());

        let mut batches = Vec::with_capacity(queries.len());
        let mut last_error = None;

        for sub_query in &queries {
            match self.search(sub_query, k).await {
                Ok(documents) => batches.push(documents),
                Err(e) => match self.failure_policy {
                    SubqueryFailurePolicy::Abort => return Err(e),
                    SubqueryFailurePolicy::Skip => {
                        tracing::warn!(sub_query = %sub_query, "Sub-query failed, skipping: {}", e);
                        last_error = Some(e);
                    }
                },
            }
        }

        if batches.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                AppError::Investigation("No sub-queries to search".to_string())
            }));
        }

        let documents = merge_candidates(batches, self.top_k);
        tracing::info!(
            sub_queries = queries.len(),
            per_query_k = k,
            count = documents.len(),
            "Multi-step retrieval complete"
        );

        Ok(RetrievalResult {
            documents,
            strategy: RetrievalStrategy::MultiStep,
            expanded_queries: Some(queries),
        })
    }

    /// Embed one query and search the index with it.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<CandidateDocument>> {
        let vector = with_timeout("embedding", self.call_timeout, self.embedder.embed(query)).await?;

        with_timeout(
            "similarity search",
            self.call_timeout,
            self.index
                .similarity_search(&vector, top_k, self.filter.as_ref()),
        )
        .await
    }
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("embedder", &self.embedder.provider_name())
            .field("documents", &self.index.len())
            .field("top_k", &self.top_k)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}
