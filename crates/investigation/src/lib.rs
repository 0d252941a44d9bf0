//! Case-file investigation pipeline.
//!
//! Answers investigator questions about a cryptocurrency exchange hack from
//! a fixed corpus of case documents:
//!
//! query → relevance gate → (rejection | retrieval → rerank → report)
//!
//! Retrieval can expand the query into several searches and merge the
//! results. Reranking fuses vector similarity with an LLM relevance rating.
//! Every stage degrades instead of failing: the returned [`Investigation`]
//! carries error flags, never a panic or a bubbled-up error.

pub mod chat;
pub mod config;
pub mod embeddings;
pub mod expander;
pub mod gate;
pub mod pipeline;
pub mod report;
pub mod rerank;
pub mod retrieval;
pub mod timeout;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

pub use chat::PromptRunner;
pub use config::{InvestigationConfig, SubqueryFailurePolicy};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use expander::{parse_expansion, QueryExpander};
pub use gate::{keyword_match, parse_verdict, RelevanceGate};
pub use pipeline::Investigator;
pub use report::ReportSynthesizer;
pub use rerank::{combine_scores, parse_rating, Reranker};
pub use retrieval::{merge_candidates, RetrievalOrchestrator};
pub use types::{
    CandidateDocument, ConfidenceLabel, Investigation, RankedDocument, Rejection,
    RelevanceVerdict, Report, RetrievalResult, RetrievalStrategy, REJECTION_MESSAGE,
};
pub use vector_index::{MemoryIndex, SearchFilter, VectorIndex};
