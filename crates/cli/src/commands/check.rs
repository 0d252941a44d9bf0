//! Check command handler.
//!
//! Runs only the relevance gate. No embedding or search work happens.

use super::setup;
use casefile_core::{config::AppConfig, AppResult};
use casefile_investigation::{InvestigationConfig, PromptRunner, Rejection, RelevanceGate};
use clap::Args;

/// Check whether a query is about the case
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// The query to check
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let settings = InvestigationConfig::load(config)?;
        let runner = PromptRunner::new(
            setup::llm_client(config)?,
            setup::prompts(config)?,
            settings.model(),
            settings.call_timeout(),
        );

        let verdict = RelevanceGate::new(runner).evaluate(&self.query).await;

        if self.json {
            let output = if verdict.is_relevant {
                serde_json::json!({
                    "query": self.query,
                    "is_relevant": true,
                    "reason": verdict.reason,
                })
            } else {
                serde_json::to_value(Rejection::new(&self.query, verdict.reason))?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if verdict.is_relevant {
            println!("Relevant: {}", verdict.reason);
        } else {
            let rejection = Rejection::new(&self.query, verdict.reason);
            println!("Not relevant: {}", rejection.reason);
            println!();
            println!("{}", rejection.message);
        }

        Ok(())
    }
}
