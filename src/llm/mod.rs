//! Language-model requesters: a prompt goes out, a tagged JSON block comes back.

pub mod extract;
pub mod meal_plan;
pub mod personalize;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::api_connection::{ApiConnectionError, ChatCompletionRequest, ChatMessage, GenerationConfig, Provider};
use crate::config::LlmConfig;

pub use extract::{extract_tagged_json, ResponseFormatError};
pub use meal_plan::{Meal, MealPlan, MealPlanRequest, MealSchedule};
pub use personalize::{PersonalizeRequest, PersonalizedRecipe};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error(transparent)]
    Connection(#[from] ApiConnectionError),
    #[error(transparent)]
    ResponseFormat(#[from] ResponseFormatError),
    #[error("model returned no content")]
    EmptyResponse,
}

/// A request to the model with a typed answer.
pub trait PromptTemplate {
    type Output: DeserializeOwned;

    fn render(&self) -> String;

    fn extract(&self, raw: &str) -> Result<Self::Output, ResponseFormatError> {
        extract_tagged_json(raw)
    }
}

/// Runs prompt templates against one provider and model.
#[derive(Debug, Clone)]
pub struct Assistant {
    provider: Provider,
    model: String,
    generation: GenerationConfig,
}

impl Assistant {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        let provider = Provider::openrouter(&config.api_key_env_var)
            .with_base_url(&config.base_url)
            .with_timeout(config.timeout);
        Self::new(provider, &config.model)
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a plain prompt and returns the model's text.
    pub async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let request = ChatCompletionRequest::new(&self.model, vec![ChatMessage::user(prompt)], self.generation);
        let response = self.provider.call_chat_completion(request).await?;
        let content = response.first_content().ok_or(LlmError::EmptyResponse)?;
        debug!(chars = content.len(), "model answered");
        Ok(content.to_string())
    }

    pub async fn ask<T>(&self, template: &T) -> Result<T::Output, LlmError>
    where
        T: PromptTemplate + Sync,
    {
        let prompt = template.render();
        info!(model = %self.model, "requesting model completion");
        let raw = self.complete(prompt).await?;
        Ok(template.extract(&raw)?)
    }
}
