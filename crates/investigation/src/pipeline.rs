//! The investigator: gate, retrieve, rerank, report.

use crate::chat::PromptRunner;
use crate::config::InvestigationConfig;
use crate::embeddings::EmbeddingProvider;
use crate::expander::QueryExpander;
use crate::gate::RelevanceGate;
use crate::report::ReportSynthesizer;
use crate::rerank::Reranker;
use crate::retrieval::RetrievalOrchestrator;
use crate::types::{Investigation, Rejection, Report, RetrievalStrategy};
use crate::vector_index::{SearchFilter, VectorIndex};
use casefile_llm::LlmClient;
use casefile_prompt::PromptLibrary;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Runs complete investigations. Holds no per-request state.
#[derive(Debug)]
pub struct Investigator {
    gate: RelevanceGate,
    retriever: RetrievalOrchestrator,
    reranker: Reranker,
    reporter: ReportSynthesizer,
    strategy: RetrievalStrategy,
}

impl Investigator {
    /// Wire every stage from one config and one set of collaborators.
    pub fn new(
        config: &InvestigationConfig,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let runner = PromptRunner::new(llm, prompts, config.model(), config.call_timeout());

        let retriever = RetrievalOrchestrator::new(
            embedder,
            index,
            QueryExpander::new(runner.clone(), config.expansion_count),
            config.top_k_retrieval,
            config.call_timeout(),
        )
        .with_failure_policy(config.subquery_failure_policy);

        Self {
            gate: RelevanceGate::new(runner.clone()),
            retriever,
            reranker: Reranker::new(runner.clone(), config.rerank_batch_size, config.top_k_rerank),
            reporter: ReportSynthesizer::new(runner),
            strategy: config.strategy,
        }
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.retriever = self.retriever.with_filter(filter);
        self
    }

    pub fn gate(&self) -> &RelevanceGate {
        &self.gate
    }

    pub fn retriever(&self) -> &RetrievalOrchestrator {
        &self.retriever
    }

    /// Investigate with the configured retrieval strategy.
    pub async fn investigate(&self, query: &str) -> Investigation {
        self.investigate_with(query, self.strategy).await
    }

    pub async fn investigate_with(&self, query: &str, strategy: RetrievalStrategy) -> Investigation {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("investigation", %id, strategy = %strategy);

        async move {
            let start = Instant::now();
            tracing::info!("Investigation started");

            let verdict = self.gate.evaluate(query).await;
            if !verdict.is_relevant {
                tracing::info!(reason = %verdict.reason, "Query rejected");
                let report = Rejection::new(query, verdict.reason.clone()).into_report();
                return Investigation {
                    id,
                    query: query.to_string(),
                    verdict,
                    retrieval: None,
                    evidence: Vec::new(),
                    report,
                };
            }

            let retrieval = match self.retriever.retrieve(query, strategy).await {
                Ok(retrieval) => retrieval,
                Err(e) => {
                    tracing::error!("Retrieval failed: {}", e);
                    let mut report =
                        Report::failed(query, format!("Error retrieving evidence: {}", e));
                    report.strategy = Some(strategy);
                    return Investigation {
                        id,
                        query: query.to_string(),
                        verdict,
                        retrieval: None,
                        evidence: Vec::new(),
                        report,
                    };
                }
            };

            let evidence = self
                .reranker
                .rerank(query, retrieval.documents.clone())
                .await;
            let report = self.reporter.synthesize(query, &evidence, &retrieval).await;

            tracing::info!(
                candidates = retrieval.documents.len(),
                evidence = evidence.len(),
                error = report.error,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Investigation finished"
            );

            Investigation {
                id,
                query: query.to_string(),
                verdict,
                retrieval: Some(retrieval),
                evidence,
                report,
            }
        }
        .instrument(span)
        .await
    }
}
