//! Completion service abstraction and OpenAI chat implementation.
//!
//! The [`CompletionModel`] trait is a single-operation capability seam:
//! given a system instruction, a user turn, and a sampling config,
//! return generated text. The core carries no conversation memory
//! beyond the one assembled prompt.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::error::PipelineError;

/// Bounded sampling configuration for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&CompletionConfig> for SamplingConfig {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Capability interface to the chat/completion service.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate text from a single system + user turn, no memory.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        sampling: SamplingConfig,
    ) -> Result<String, PipelineError>;
}

/// Completion provider backed by the OpenAI chat completions API.
///
/// Calls `POST {api_base}/chat/completions` with the configured model.
/// Requires the `OPENAI_API_KEY` environment variable. Transient errors
/// (429, 5xx, network) are retried with the same backoff schedule as
/// the embedding provider.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self, PipelineError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            PipelineError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompletion {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        sampling: SamplingConfig,
    ) -> Result<String, PipelineError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| PipelineError::CompletionFailed(e.to_string()))?;
                        return parse_completion_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = PipelineError::CompletionFailed(format!(
                        "chat completions API error {}: {}",
                        status, body_text
                    ));

                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(PipelineError::CompletionFailed(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            PipelineError::CompletionFailed("completion failed after retries".to_string())
        }))
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String, PipelineError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PipelineError::CompletionFailed(
                "invalid chat completions response: missing content".to_string(),
            )
        })
}
