//! The set of prompt definitions used by one pipeline run.

use crate::builder::build_prompt;
use crate::builtin::BUILTIN_SOURCES;
use crate::loader::{load_builtin, load_prompt};
use crate::types::{BuiltPrompt, PromptDefinition};
use casefile_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Prompt definitions resolved once, rendered many times.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library containing only the built-in prompts.
    pub fn builtin() -> AppResult<Self> {
        let mut definitions = HashMap::new();
        for (id, _) in BUILTIN_SOURCES.iter() {
            definitions.insert(id.to_string(), load_builtin(id)?);
        }
        Ok(Self { definitions })
    }

    /// Library for a workspace: built-ins, with `.casefile/prompts/` overrides applied.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut definitions = HashMap::new();
        for (id, _) in BUILTIN_SOURCES.iter() {
            definitions.insert(id.to_string(), load_prompt(workspace_path, id)?);
        }
        tracing::debug!(count = definitions.len(), "Prompt library loaded");
        Ok(Self { definitions })
    }

    pub fn get(&self, prompt_id: &str) -> AppResult<&PromptDefinition> {
        self.definitions
            .get(prompt_id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
    }

    /// Render a prompt by id with the given variables.
    pub fn render<I, K, V>(&self, prompt_id: &str, variables: I) -> AppResult<BuiltPrompt>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = variables
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<HashMap<String, String>>();
        build_prompt(self.get(prompt_id)?, vars)
    }
}
