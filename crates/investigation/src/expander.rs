//! Query expansion: one investigator question becomes several search queries.

use crate::chat::PromptRunner;
use casefile_prompt::builtin::EXPAND;
use tracing::instrument;

/// Queries kept from a colon-formatted reply.
const MAX_FALLBACK_QUERIES: usize = 3;

/// Parse the expander's reply. Never returns an empty list.
///
/// 1. A JSON array of strings between the first `[` and the last `]`.
/// 2. Otherwise the text after the first colon of each line that has one,
///    at most three, followed by the original query.
/// 3. Otherwise just the original query.
pub fn parse_expansion(response: &str, original: &str) -> Vec<String> {
    if let Some(queries) = parse_json_array(response) {
        return queries;
    }

    let mut queries: Vec<String> = response
        .lines()
        .filter_map(|line| line.split_once(':').map(|(_, rest)| rest.trim()))
        .filter(|rest| !rest.is_empty())
        .take(MAX_FALLBACK_QUERIES)
        .map(str::to_string)
        .collect();

    if queries.is_empty() {
        return vec![original.to_string()];
    }

    queries.push(original.to_string());
    queries
}

fn parse_json_array(response: &str) -> Option<Vec<String>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end <= start {
        return None;
    }

    let parsed: Vec<String> = serde_json::from_str(&response[start..=end]).ok()?;
    let queries: Vec<String> = parsed
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if queries.is_empty() {
        None
    } else {
        Some(queries)
    }
}

/// Asks the model for investigation-focused reformulations.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    runner: PromptRunner,
    count: usize,
}

impl QueryExpander {
    pub fn new(runner: PromptRunner, count: usize) -> Self {
        Self {
            runner,
            count: count.max(1),
        }
    }

    #[instrument(skip(self))]
    pub async fn expand(&self, query: &str) -> Vec<String> {
        let count = self.count.to_string();
        match self
            .runner
            .run(EXPAND, [("query", query), ("count", count.as_str())])
            .await
        {
            Ok(response) => {
                let queries = parse_expansion(&response, query);
                tracing::debug!(count = queries.len(), "Query expanded");
                queries
            }
            Err(e) => {
                tracing::warn!("Query expansion failed, searching with original query: {}", e);
                vec![query.to_string()]
            }
        }
    }
}
