//! Error types for inbox-triage.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {key}. {hint}")]
    MissingEnvVar { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rules document errors.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Duplicate category heading: {name}")]
    DuplicateCategory { name: String },

    #[error("Rules document defines no categories")]
    NoCategories,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mailbox API errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error(
        "Mailbox authentication failed: {reason}. \
         Re-run the interactive OAuth consent flow on a machine with a browser \
         and update GMAIL_REFRESH_TOKEN."
    )]
    AuthFailed { reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Mailbox API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid mailbox response: {0}")]
    InvalidResponse(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while driving a triage cycle.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Audit log write failed: {0}")]
    Audit(#[from] std::io::Error),

    #[error("No label reconciled for category {0}")]
    MissingLabel(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
