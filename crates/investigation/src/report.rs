//! Report synthesis from the reranked evidence.

use crate::chat::PromptRunner;
use crate::types::{RankedDocument, Report, RetrievalResult, RetrievalStrategy};
use casefile_prompt::builtin::REPORT;
use chrono::Utc;
use tracing::instrument;

/// Evidence block handed to the model, one `DOCUMENT i` section per document.
pub fn format_evidence(ranked: &[RankedDocument]) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "DOCUMENT {} (Confidence: {}):\n{}",
                i + 1,
                doc.confidence,
                doc.text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Expanded queries listing, multi-step retrieval only.
pub fn format_strategy_info(retrieval: &RetrievalResult) -> Option<String> {
    if retrieval.strategy != RetrievalStrategy::MultiStep {
        return None;
    }

    let queries = retrieval.expanded_queries.as_ref().filter(|q| !q.is_empty())?;
    let lines: Vec<String> = queries.iter().map(|q| format!("- {}", q)).collect();
    Some(format!("Expanded search queries used:\n{}", lines.join("\n")))
}

#[derive(Debug, Clone)]
pub struct ReportSynthesizer {
    runner: PromptRunner,
}

impl ReportSynthesizer {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }

    /// Write the investigation report. Failures become an error report.
    #[instrument(skip(self, ranked, retrieval), fields(evidence = ranked.len()))]
    pub async fn synthesize(
        &self,
        query: &str,
        ranked: &[RankedDocument],
        retrieval: &RetrievalResult,
    ) -> Report {
        let evidence = format_evidence(ranked);
        let mut variables = vec![("query", query.to_string()), ("evidence", evidence)];
        if let Some(info) = format_strategy_info(retrieval) {
            variables.push(("strategy_info", info));
        }

        let timestamp = Utc::now();
        match self.runner.run(REPORT, variables).await {
            Ok(text) => Report {
                text,
                query: query.to_string(),
                timestamp,
                evidence_count: ranked.len(),
                strategy: Some(retrieval.strategy),
                error: false,
                is_relevant: None,
                rejection_reason: None,
            },
            Err(e) => {
                tracing::error!("Report generation failed: {}", e);
                Report {
                    text: format!("Error generating report: {}", e),
                    query: query.to_string(),
                    timestamp,
                    evidence_count: ranked.len(),
                    strategy: Some(retrieval.strategy),
                    error: true,
                    is_relevant: None,
                    rejection_reason: None,
                }
            }
        }
    }
}
