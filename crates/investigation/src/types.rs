//! Data model of the investigation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Apology returned when the gate rejects a query.
pub const REJECTION_MESSAGE: &str = "I'm sorry, I can only answer questions related to the cryptocurrency exchange hack investigation. Your query appears to be unrelated to this case.";

/// A document returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Chunk identifier, e.g. `wallet_analysis.txt_chunk_2`
    pub id: String,

    /// Chunk text
    pub text: String,

    /// Similarity score in [0, 1]
    pub vector_score: f32,

    /// Source metadata (`source`, `file_name`, `chunk_index`, `total_chunks`)
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::json!({})
}

impl CandidateDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, vector_score: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector_score,
            metadata: empty_metadata(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// File the chunk was cut from, if recorded.
    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get("file_name").and_then(|v| v.as_str())
    }

    pub fn chunk_index(&self) -> Option<u64> {
        self.metadata.get("chunk_index").and_then(|v| v.as_u64())
    }
}

/// Confidence band derived from the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl ConfidenceLabel {
    /// Band a combined score: 0.8 / 0.6 / 0.4 / 0.2 lower bounds, inclusive.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            Self::VeryHigh
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate after LLM reranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    #[serde(flatten)]
    pub document: CandidateDocument,

    /// LLM-judged relevance in [0, 1]
    pub relevance_score: f32,

    /// `0.4 * vector_score + 0.6 * relevance_score`
    pub combined_score: f32,

    pub confidence: ConfidenceLabel,
}

impl RankedDocument {
    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }

    pub fn vector_score(&self) -> f32 {
        self.document.vector_score
    }
}

/// How candidates are fetched from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalStrategy {
    /// One embedding, one search
    SingleStep,
    /// Expand the query, search each expansion, merge
    #[default]
    MultiStep,
}

impl RetrievalStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleStep => "single-step",
            Self::MultiStep => "multi-step",
        }
    }
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "single-step" | "single" => Ok(Self::SingleStep),
            "multi-step" | "multi" => Ok(Self::MultiStep),
            other => Err(format!(
                "Unknown retrieval strategy: {}. Expected single-step or multi-step",
                other
            )),
        }
    }
}

/// Output of the retrieval stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<CandidateDocument>,

    pub strategy: RetrievalStrategy,

    /// Queries actually searched; multi-step only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_queries: Option<Vec<String>>,
}

/// Gate decision for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    pub is_relevant: bool,
    pub reason: String,
}

impl RelevanceVerdict {
    pub fn relevant(reason: impl Into<String>) -> Self {
        Self {
            is_relevant: true,
            reason: reason.into(),
        }
    }

    pub fn irrelevant(reason: impl Into<String>) -> Self {
        Self {
            is_relevant: false,
            reason: reason.into(),
        }
    }
}

/// Early-exit payload for a rejected query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub query: String,
    pub is_relevant: bool,
    pub reason: String,
    pub message: String,
}

impl Rejection {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            is_relevant: false,
            reason: reason.into(),
            message: REJECTION_MESSAGE.to_string(),
        }
    }

    /// The report handed back in place of an investigation report.
    pub fn into_report(self) -> Report {
        Report {
            text: self.message,
            query: self.query,
            timestamp: Utc::now(),
            evidence_count: 0,
            strategy: None,
            error: true,
            is_relevant: Some(false),
            rejection_reason: Some(self.reason),
        }
    }
}

/// The synthesized narrative and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub text: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub evidence_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RetrievalStrategy>,

    #[serde(default)]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_relevant: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Report {
    /// A report that only carries an error message.
    pub fn failed(query: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: query.into(),
            timestamp: Utc::now(),
            evidence_count: 0,
            strategy: None,
            error: true,
            is_relevant: None,
            rejection_reason: None,
        }
    }

    /// Timestamp as shown in text output.
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Everything produced for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: Uuid,
    pub query: String,
    pub verdict: RelevanceVerdict,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalResult>,

    pub evidence: Vec<RankedDocument>,
    pub report: Report,
}

impl Investigation {
    pub fn is_rejected(&self) -> bool {
        !self.verdict.is_relevant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands_are_inclusive() {
        assert_eq!(ConfidenceLabel::from_score(0.8), ConfidenceLabel::VeryHigh);
        assert_eq!(ConfidenceLabel::from_score(0.79), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::from_score(0.6), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::from_score(0.59), ConfidenceLabel::Medium);
        assert_eq!(ConfidenceLabel::from_score(0.4), ConfidenceLabel::Medium);
        assert_eq!(ConfidenceLabel::from_score(0.39), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_score(0.2), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_score(0.19), ConfidenceLabel::VeryLow);
        assert_eq!(ConfidenceLabel::from_score(0.0), ConfidenceLabel::VeryLow);
        assert_eq!(ConfidenceLabel::from_score(1.0), ConfidenceLabel::VeryHigh);
    }

    #[test]
    fn test_confidence_label_ordering_and_serde() {
        assert!(ConfidenceLabel::VeryLow < ConfidenceLabel::Low);
        assert!(ConfidenceLabel::High < ConfidenceLabel::VeryHigh);

        let json = serde_json::to_string(&ConfidenceLabel::VeryHigh).unwrap();
        assert_eq!(json, "\"Very High\"");
        let back: ConfidenceLabel = serde_json::from_str("\"Very Low\"").unwrap();
        assert_eq!(back, ConfidenceLabel::VeryLow);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "single-step".parse::<RetrievalStrategy>().unwrap(),
            RetrievalStrategy::SingleStep
        );
        assert_eq!(
            "Multi_Step".parse::<RetrievalStrategy>().unwrap(),
            RetrievalStrategy::MultiStep
        );
        assert!("sideways".parse::<RetrievalStrategy>().is_err());
        assert_eq!(RetrievalStrategy::default(), RetrievalStrategy::MultiStep);
        assert_eq!(
            serde_json::to_string(&RetrievalStrategy::SingleStep).unwrap(),
            "\"single-step\""
        );
    }

    #[test]
    fn test_rejection_report() {
        let report = Rejection::new("weather in Paris?", "Not about the case").into_report();

        assert!(report.error);
        assert_eq!(report.is_relevant, Some(false));
        assert_eq!(report.text, REJECTION_MESSAGE);
        assert_eq!(report.rejection_reason.as_deref(), Some("Not about the case"));
        assert_eq!(report.evidence_count, 0);
        assert!(report.strategy.is_none());
    }

    #[test]
    fn test_ranked_document_serializes_flat() {
        let ranked = RankedDocument {
            document: CandidateDocument::new("a.txt_chunk_0", "text", 0.5)
                .with_metadata(serde_json::json!({"file_name": "a.txt", "chunk_index": 0})),
            relevance_score: 0.85,
            combined_score: 0.71,
            confidence: ConfidenceLabel::High,
        };

        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(value["id"], "a.txt_chunk_0");
        assert_eq!(value["confidence"], "High");
        assert_eq!(value["metadata"]["file_name"], "a.txt");
        assert_eq!(ranked.document.file_name(), Some("a.txt"));
        assert_eq!(ranked.document.chunk_index(), Some(0));
    }
}
