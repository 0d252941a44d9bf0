//! Relevance gate.
//!
//! Decides whether a query belongs to the investigation before any
//! embedding or search work happens. A curated keyword list short-circuits
//! the common case; everything else goes to an LLM judge. Judge failures
//! let the query through.

use crate::chat::PromptRunner;
use crate::types::RelevanceVerdict;
use casefile_prompt::builtin::GATE;
use tracing::instrument;
use unicode_segmentation::UnicodeSegmentation;

/// Terms that mark a query as in-domain without asking the judge.
pub const RELEVANCE_KEYWORDS: &[&str] = &[
    "cryptocurrency",
    "crypto",
    "exchange",
    "hack",
    "hacker",
    "theft",
    "stolen",
    "blockchain",
    "transaction",
    "wallet",
    "bitcoin",
    "ethereum",
    "evidence",
    "investigation",
    "trace",
    "forensic",
    "security",
    "breach",
    "attack",
    "exploit",
    "vulnerability",
    "suspect",
    "money laundering",
    "tumbler",
    "mixer",
    "tracking",
    "addresses",
    "keys",
    "digital",
    "transfer",
    "suspicious",
    "activity",
    "anonymity",
    "pseudonymous",
    "signature",
    "ledger",
    "timestamp",
    "record",
    "analysis",
    "pattern",
    "behavior",
    "identity",
    "method",
    "technique",
    "tool",
    "trail",
    "cover tracks",
    "obfuscation",
    "$5 million",
];

/// Sentinels in the judge's reply.
///
/// Only standalone occurrences count (not preceded by a letter or digit),
/// so the `RELEVANT:` inside `IRRELEVANT:` is ignored. The last sentinel in
/// the reply decides.
pub const VERDICT_RULES: &[(&str, bool)] = &[("IRRELEVANT:", false), ("RELEVANT:", true)];

/// Heuristic applied when the judge used neither sentinel.
pub struct FallbackRule {
    /// Any of these in the lowercased reply fires the rule; empty always fires
    pub terms: &'static [&'static str],
    pub is_relevant: bool,
    pub reason: &'static str,
}

pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        terms: &["crypto", "hack", "exchange", "investigation"],
        is_relevant: true,
        reason: "Query might be related to the investigation",
    },
    FallbackRule {
        terms: &[],
        is_relevant: false,
        reason: "Query appears to be unrelated to the investigation",
    },
];

pub const KEYWORD_MATCH_REASON: &str = "keyword match";

const MAX_REASON_CHARS: usize = 150;

/// Whether the lowercased query contains a curated keyword.
pub fn keyword_match(query: &str) -> bool {
    let lower = query.to_lowercase();
    RELEVANCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Turn the judge's free text into a verdict. Never fails.
pub fn parse_verdict(response: &str) -> RelevanceVerdict {
    if let Some((pos, is_relevant)) = last_sentinel(response) {
        let preceding = collapse_whitespace(&response[..pos]);
        let reason = if preceding.is_empty() {
            collapse_whitespace(response)
        } else {
            preceding
        };
        return RelevanceVerdict {
            is_relevant,
            reason: truncate_reason(&reason),
        };
    }

    let lower = response.to_lowercase();
    for rule in FALLBACK_RULES {
        if rule.terms.is_empty() || rule.terms.iter().any(|t| lower.contains(t)) {
            return RelevanceVerdict {
                is_relevant: rule.is_relevant,
                reason: rule.reason.to_string(),
            };
        }
    }

    RelevanceVerdict::irrelevant("Query appears to be unrelated to the investigation")
}

/// Byte offset and verdict of the last standalone sentinel.
fn last_sentinel(response: &str) -> Option<(usize, bool)> {
    VERDICT_RULES
        .iter()
        .flat_map(|(sentinel, is_relevant)| {
            response
                .match_indices(sentinel)
                .filter(|(pos, _)| {
                    response[..*pos]
                        .chars()
                        .next_back()
                        .map_or(true, |c| !c.is_alphanumeric())
                })
                .map(move |(pos, _)| (pos, *is_relevant))
        })
        .max_by_key(|(pos, _)| *pos)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap at 150 characters, the last three being `...` when cut.
fn truncate_reason(reason: &str) -> String {
    let graphemes: Vec<&str> = reason.graphemes(true).collect();
    if graphemes.len() <= MAX_REASON_CHARS {
        reason.to_string()
    } else {
        format!("{}...", graphemes[..MAX_REASON_CHARS - 3].concat())
    }
}

/// Topic filter in front of the pipeline.
#[derive(Debug, Clone)]
pub struct RelevanceGate {
    runner: PromptRunner,
}

impl RelevanceGate {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }

    /// Decide whether `query` is about the case.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, query: &str) -> RelevanceVerdict {
        if keyword_match(query) {
            tracing::debug!("Query accepted by keyword match");
            return RelevanceVerdict::relevant(KEYWORD_MATCH_REASON);
        }

        match self.runner.run(GATE, [("query", query)]).await {
            Ok(response) => {
                let verdict = parse_verdict(&response);
                tracing::info!(
                    is_relevant = verdict.is_relevant,
                    reason = %verdict.reason,
                    "Relevance judged by model"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!("Relevance check failed, letting query through: {}", e);
                RelevanceVerdict::relevant(format!(
                    "Error validating query, proceeding with caution: {}",
                    e
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use casefile_prompt::PromptLibrary;
    use std::sync::Arc;
    use std::time::Duration;

    fn gate(llm: Arc<ScriptedLlm>) -> RelevanceGate {
        RelevanceGate::new(PromptRunner::new(
            llm,
            Arc::new(PromptLibrary::builtin().unwrap()),
            "test-model",
            Duration::from_secs(5),
        ))
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_substring() {
        assert!(keyword_match("Which WALLET received the funds?"));
        assert!(keyword_match("who stole the $5 million"));
        assert!(keyword_match("cryptographic signatures")); // "crypto" substring
        assert!(!keyword_match("What's the weather in Paris?"));
    }

    #[test]
    fn test_irrelevant_sentinel_wins() {
        let verdict = parse_verdict(
            "The query asks about the weather.\nIRRELEVANT: This query is not about the crypto hack investigation",
        );
        assert!(!verdict.is_relevant);
        assert_eq!(verdict.reason, "The query asks about the weather.");
    }

    #[test]
    fn test_relevant_sentinel() {
        let verdict = parse_verdict(
            "It concerns   the suspect's\n\nalibi.\nRELEVANT: This query is about the crypto hack investigation",
        );
        assert!(verdict.is_relevant);
        assert_eq!(verdict.reason, "It concerns the suspect's alibi.");
    }

    #[test]
    fn test_final_sentinel_decides_when_both_are_quoted() {
        let verdict = parse_verdict(
            "The options are \"RELEVANT: ...\" and \"IRRELEVANT: ...\". The query asks about a suspect's movements.\nRELEVANT: This query is about the crypto hack investigation",
        );
        assert!(verdict.is_relevant);
        assert!(verdict.reason.ends_with("The query asks about a suspect's movements."));

        let verdict = parse_verdict(
            "Either \"RELEVANT:\" or \"IRRELEVANT:\" applies. This is about lunch.\nIRRELEVANT: not about the case",
        );
        assert!(!verdict.is_relevant);
        assert!(verdict.reason.ends_with("This is about lunch."));
    }

    #[test]
    fn test_embedded_sentinel_is_not_standalone() {
        // "RELEVANT:" inside "IRRELEVANT:" never counts on its own
        let verdict = parse_verdict("Off topic.\nIRRELEVANT: weather");
        assert!(!verdict.is_relevant);
        assert_eq!(verdict.reason, "Off topic.");
    }

    #[test]
    fn test_sentinel_first_uses_whole_response() {
        let verdict = parse_verdict("RELEVANT: This query is about the crypto hack investigation");
        assert!(verdict.is_relevant);
        assert_eq!(
            verdict.reason,
            "RELEVANT: This query is about the crypto hack investigation"
        );
    }

    #[test]
    fn test_long_reason_truncated() {
        let reasoning = "word ".repeat(100);
        let verdict = parse_verdict(&format!("{}IRRELEVANT: no", reasoning));
        assert_eq!(verdict.reason.chars().count(), 150);
        assert!(verdict.reason.ends_with("..."));
    }

    #[test]
    fn test_fallback_rules() {
        let verdict = parse_verdict("This might be about the exchange.");
        assert!(verdict.is_relevant);
        assert_eq!(verdict.reason, "Query might be related to the investigation");

        let verdict = parse_verdict("I cannot tell.");
        assert!(!verdict.is_relevant);
        assert_eq!(
            verdict.reason,
            "Query appears to be unrelated to the investigation"
        );
    }

    #[tokio::test]
    async fn test_keyword_query_skips_judge() {
        let llm = Arc::new(ScriptedLlm::new().otherwise("IRRELEVANT: no"));
        let verdict = gate(llm.clone())
            .evaluate("Trace the bitcoin transfers")
            .await;

        assert!(verdict.is_relevant);
        assert_eq!(verdict.reason, KEYWORD_MATCH_REASON);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_judge_rejects_off_topic_query() {
        let llm = Arc::new(ScriptedLlm::new().on(
            "Query: What's the weather in Paris?",
            "Weather is unrelated.\nIRRELEVANT: This query is not about the crypto hack investigation",
        ));
        let verdict = gate(llm.clone()).evaluate("What's the weather in Paris?").await;

        assert!(!verdict.is_relevant);
        assert_eq!(verdict.reason, "Weather is unrelated.");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_judge_failure_fails_open() {
        let llm = Arc::new(ScriptedLlm::new().fail_on("Query:", "connection refused"));
        let verdict = gate(llm).evaluate("Who is Alice?").await;

        assert!(verdict.is_relevant);
        assert!(verdict
            .reason
            .starts_with("Error validating query, proceeding with caution: "));
        assert!(verdict.reason.contains("connection refused"));
    }
}
