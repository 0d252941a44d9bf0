//! Investigate command handler.
//!
//! Runs the full pipeline: relevance gate, retrieval, rerank, report.

use super::setup;
use casefile_core::{config::AppConfig, AppResult};
use casefile_investigation::{Investigation, InvestigationConfig, Investigator, RetrievalStrategy};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Run a full investigation and print the report
#[derive(Args, Debug)]
pub struct InvestigateCommand {
    /// The investigator's question
    pub query: String,

    /// Corpus file (JSON array of chunks)
    #[arg(short, long)]
    pub index: PathBuf,

    /// Retrieval strategy (single-step, multi-step)
    #[arg(short, long)]
    pub strategy: Option<RetrievalStrategy>,

    /// Candidates fetched from the index
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Documents kept after reranking
    #[arg(long)]
    pub rerank_top_k: Option<usize>,

    /// Restrict retrieval to metadata KEY=VALUE (repeatable)
    #[arg(long)]
    pub filter: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InvestigateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing investigate command");
        tracing::debug!("Investigate command options: {:?}", self);

        let settings = InvestigationConfig::load(config)?
            .with_overrides(self.strategy, self.top_k, self.rerank_top_k);
        settings.validate()?;

        let embedder = setup::embedder(config, &settings)?;
        let index = setup::load_index(&self.index, embedder.as_ref()).await?;

        let investigator = Investigator::new(
            &settings,
            setup::llm_client(config)?,
            setup::prompts(config)?,
            embedder,
            Arc::new(index),
        )
        .with_filter(setup::parse_filter(&self.filter)?);

        let investigation = investigator.investigate(&self.query).await;

        if self.json {
            let json = serde_json::to_string_pretty(&investigation)?;
            println!("{}", json);
        } else {
            print_report(&investigation);
        }

        Ok(())
    }
}

fn print_report(investigation: &Investigation) {
    let report = &investigation.report;

    println!("{}", report.text);
    println!();

    if investigation.is_rejected() {
        if let Some(reason) = &report.rejection_reason {
            println!("Reason: {}", reason);
        }
        return;
    }

    if !investigation.evidence.is_empty() {
        println!("Evidence:");
        for (i, doc) in investigation.evidence.iter().enumerate() {
            println!(
                "  {}. {} [{}] combined {:.2} (vector {:.2}, relevance {:.2})",
                i + 1,
                doc.document.file_name().unwrap_or(doc.id()),
                doc.confidence,
                doc.combined_score,
                doc.vector_score(),
                doc.relevance_score
            );
        }
        println!();
    }

    let strategy = report
        .strategy
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!(
        "Generated {} | strategy {} | {} evidence documents",
        report.display_timestamp(),
        strategy,
        report.evidence_count
    );
}
