use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, Provider, DEFAULT_TIMEOUT, OPENROUTER_BASE_URL,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        match self {
            Provider::OpenRouter { api_key, timeout, .. } => Provider::OpenRouter {
                api_key,
                base_url: url.into(),
                timeout,
            },
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        match self {
            Provider::OpenRouter { api_key, base_url, .. } => Provider::OpenRouter {
                api_key,
                base_url,
                timeout,
            },
        }
    }

    pub fn endpoint(&self) -> String {
        match self {
            Provider::OpenRouter { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Sends one completion request. Failures are returned as-is; nothing is retried.
    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                timeout,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let client = Client::builder().timeout(*timeout).build()?;
                let url = self.endpoint();

                let site_url = env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "NutriAssist".to_string());

                debug!(%url, model = %request.model, "sending chat completion request");
                let response = client
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "chat completion request rejected");
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
