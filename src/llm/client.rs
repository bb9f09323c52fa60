use std::env;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, Message};
use crate::config::ConfigError;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned no choices")]
    EmptyResponse,

    #[error("malformed model response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Chat-completion capability used for classification, planning, scoring and answering.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait LanguageModel {
    fn chat(&self, messages: &[Message])
    -> impl Future<Output = Result<String, ModelError>> + Send;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env(http: Client) -> Result<Self, ConfigError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;
        let model = non_empty_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = non_empty_var("OPENAI_BASE_URL").unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LanguageModel for OpenAiClient {
    async fn chat(&self, messages: &[Message]) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if let Ok(body) = serde_json::from_str::<ChatCompletionResponse>(&text)
                && let Some(err) = body.error
            {
                let message = err.message.unwrap_or_else(|| "unknown error".to_string());
                warn!(status = %status, kind = ?err.kind, "model API error");
                return Err(ModelError::Api {
                    code: status.as_u16(),
                    message,
                });
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "model API error (no structured body)");
            return Err(ModelError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: ChatCompletionResponse = serde_json::from_str(&text)?;
        if let Some(err) = body.error {
            let message = err.message.unwrap_or_else(|| "unknown error".to_string());
            warn!(error = %message, "model API error in 200 response");
            return Err(ModelError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyResponse)?
            .message
            .content
            .unwrap_or_default();

        debug!(model = %self.model, chars = content.len(), "chat complete");
        Ok(content)
    }
}
