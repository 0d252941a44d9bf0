//! Prompt-driven chat completions shared by the pipeline stages.

use crate::timeout::with_timeout;
use casefile_core::AppResult;
use casefile_llm::{LlmClient, LlmRequest};
use casefile_prompt::PromptLibrary;
use std::sync::Arc;
use std::time::Duration;

/// Renders a named prompt and sends it to the chat model.
///
/// Sampling settings (temperature, max tokens) and the system message come
/// from the prompt definition.
#[derive(Clone)]
pub struct PromptRunner {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
    call_timeout: Duration,
}

impl PromptRunner {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        model: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            prompts,
            model: model.into(),
            call_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render `prompt_id` with `variables` and return the completion text.
    pub async fn run<I, K, V>(&self, prompt_id: &str, variables: I) -> AppResult<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let built = self.prompts.render(prompt_id, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = built.sampling.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = built.sampling.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            prompt = prompt_id,
            provider = self.client.provider_name(),
            model = %self.model,
            "Sending chat completion"
        );

        let response =
            with_timeout(prompt_id, self.call_timeout, self.client.complete(&request)).await?;
        Ok(response.content)
    }
}

impl std::fmt::Debug for PromptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRunner")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
