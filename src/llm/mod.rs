//! LLM integration — the decision oracle behind classification.
//!
//! One provider is supported: the Anthropic Messages API, called directly
//! over HTTP. The [`CompletionProvider`] trait is the seam the classifier
//! (and tests) work against.

pub mod anthropic;
pub mod classifier;

pub use anthropic::AnthropicProvider;
pub use classifier::{Classification, Classifier, FallbackPolicy};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

/// A single-shot text-completion provider.
///
/// One request, one text completion. Call failures propagate as-is — retry
/// and fallback decisions belong to the caller, not the transport.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt` with at most `max_tokens` output tokens.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;

    /// Model identifier used for requests.
    fn model_name(&self) -> &str;
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create the configured LLM provider.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn CompletionProvider> {
    tracing::info!("Using Anthropic (model: {})", config.model);
    Arc::new(AnthropicProvider::new(config.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_carries_model_name() {
        // The API key is only validated when a request is made.
        let config = LlmConfig {
            api_key: secrecy::SecretString::from("test-key"),
            model: "claude-sonnet-4-5-20250929".to_string(),
        };
        let provider = create_provider(&config);
        assert_eq!(provider.model_name(), "claude-sonnet-4-5-20250929");
    }
}
