//! Anthropic provider — non-streaming Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{CompletionProvider, LlmConfig};

/// Base URL for the Anthropic API.
const BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider with a shared HTTP client.
    pub fn with_client(config: LlmConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Extract the first text block from a Messages API response.
fn extract_text(response: MessagesResponse) -> Result<String, LlmError> {
    response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .map(|block| block.text)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: "anthropic".to_string(),
            reason: "response contains no text content block".to_string(),
        })
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/v1/messages"))
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited {
                provider: "anthropic".to_string(),
                retry_after,
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(LlmError::AuthFailed {
                provider: "anthropic".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "anthropic".to_string(),
                reason: format!("malformed response body: {e}"),
            })?;

        extract_text(parsed)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_block() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Important: a receipt"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Important: a receipt");
    }

    #[test]
    fn skips_non_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking"},{"type":"text","text":"Optional: bulk mail"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Optional: bulk mail");
    }

    #[test]
    fn empty_content_is_invalid() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(LlmError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn request_serializes_to_messages_shape() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-5-20250929",
            max_tokens: 150,
            messages: vec![RequestMessage {
                role: "user",
                content: "classify this",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
