//! Pipeline settings.
//!
//! Read from the `investigation:` section of the workspace config file,
//! the same file that holds the `llm:` and `logging:` sections.
//!
//! ```yaml
//! investigation:
//!   strategy: multi-step
//!   topKRetrieval: 5
//!   topKRerank: 3
//!   rerankBatchSize: 5
//!   callTimeoutSecs: 60
//!   subqueryFailurePolicy: skip
//! ```

use crate::types::RetrievalStrategy;
use casefile_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// What to do when one expanded sub-query fails to embed or search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubqueryFailurePolicy {
    /// Log it and carry on with the remaining sub-queries
    #[default]
    Skip,
    /// Fail the whole retrieval
    Abort,
}

/// Settings for one investigator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvestigationConfig {
    pub strategy: RetrievalStrategy,

    /// Candidates kept after retrieval (K)
    pub top_k_retrieval: usize,

    /// Documents kept after reranking (N)
    pub top_k_rerank: usize,

    /// Reformulations requested from the expander
    pub expansion_count: usize,

    pub rerank_batch_size: usize,

    /// Budget for each external call
    pub call_timeout_secs: u64,

    pub subquery_failure_policy: SubqueryFailurePolicy,

    /// Chat model; falls back to the active provider's model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Embedding model; falls back to the active embedding provider's model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Embedding width; derived from the model name when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dimensions: Option<usize>,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::MultiStep,
            top_k_retrieval: 5,
            top_k_rerank: 3,
            expansion_count: 3,
            rerank_batch_size: 5,
            call_timeout_secs: 60,
            subquery_failure_policy: SubqueryFailurePolicy::Skip,
            model: None,
            embedding_model: None,
            embedding_dimensions: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFileSection {
    #[serde(default)]
    investigation: Option<InvestigationConfig>,
}

impl InvestigationConfig {
    /// Load the pipeline settings that go with an application config.
    ///
    /// Model names not set in the `investigation:` section are taken from
    /// the application config.
    pub fn load(app: &AppConfig) -> AppResult<Self> {
        let path = app.config_path();
        let mut config = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            tracing::debug!("No config file at {:?}, using default investigation settings", path);
            Self::default()
        };

        if config.model.is_none() {
            config.model = Some(app.model.clone());
        }
        if config.embedding_model.is_none() {
            config.embedding_model = Some(app.embedding_model.clone());
        }

        // Width ordering is checked by callers once CLI overrides are in
        config.validate_positive()?;
        Ok(config)
    }

    /// Read only the `investigation:` section of a YAML file.
    pub fn load_from_path(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", path, e))
        })?;

        let section: ConfigFileSection = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded investigation settings from {:?}", path);
        Ok(section.investigation.unwrap_or_default())
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        strategy: Option<RetrievalStrategy>,
        top_k_retrieval: Option<usize>,
        top_k_rerank: Option<usize>,
    ) -> Self {
        if let Some(strategy) = strategy {
            self.strategy = strategy;
        }
        if let Some(k) = top_k_retrieval {
            self.top_k_retrieval = k;
        }
        if let Some(n) = top_k_rerank {
            self.top_k_rerank = n;
        }
        self
    }

    /// Full check: every count positive and the rerank width below the
    /// retrieval width.
    pub fn validate(&self) -> AppResult<()> {
        self.validate_positive()?;

        if self.top_k_rerank >= self.top_k_retrieval {
            return Err(AppError::Config(format!(
                "topKRerank ({}) must be smaller than topKRetrieval ({})",
                self.top_k_rerank, self.top_k_retrieval
            )));
        }

        Ok(())
    }

    /// Every count and the timeout must be at least 1.
    pub fn validate_positive(&self) -> AppResult<()> {
        let positive = [
            ("topKRetrieval", self.top_k_retrieval as u64),
            ("topKRerank", self.top_k_rerank as u64),
            ("expansionCount", self.expansion_count as u64),
            ("rerankBatchSize", self.rerank_batch_size as u64),
            ("callTimeoutSecs", self.call_timeout_secs),
        ];

        for (name, value) in positive {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be at least 1", name)));
            }
        }

        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("llama3.2")
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or("nomic-embed-text")
    }
}
