//! Retrieve command handler.
//!
//! Runs retrieval alone, without the gate or reranking, to audit query
//! expansion and candidate merging.

use super::setup;
use casefile_core::{config::AppConfig, AppResult};
use casefile_investigation::{InvestigationConfig, Investigator, RetrievalStrategy};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Retrieve candidate evidence without reranking
#[derive(Args, Debug)]
pub struct RetrieveCommand {
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

    /// Restrict retrieval to metadata KEY=VALUE (repeatable)
    #[arg(long)]
    pub filter: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let settings =
            InvestigationConfig::load(config)?.with_overrides(self.strategy, self.top_k, None);
        settings.validate_positive()?;

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

        let result = investigator
            .retriever()
            .retrieve(&self.query, settings.strategy)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        if let Some(queries) = &result.expanded_queries {
            println!("Search queries:");
            for query in queries {
                println!("  - {}", query);
            }
            println!();
        }

        println!(
            "{} candidates ({}):",
            result.documents.len(),
            result.strategy
        );
        for (i, doc) in result.documents.iter().enumerate() {
            println!(
                "  {}. [{:.3}] {}",
                i + 1,
                doc.vector_score,
                doc.file_name().unwrap_or(&doc.id)
            );
        }

        Ok(())
    }
}
