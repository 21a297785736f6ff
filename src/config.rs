//! Service configuration, built from environment variables.
//!
//! One value object threaded through the constructors — no ambient global
//! state. Everything here has a default; required secrets (the Anthropic
//! API key, the Gmail credentials) are validated separately at startup.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::llm::FallbackPolicy;
use crate::rules::loader::RemoteRules;

/// Default model for classification calls.
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Triage service configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Directory holding the rules document and the audit log.
    pub config_dir: PathBuf,
    /// Model identifier for the classification calls.
    pub model: String,
    /// Pause between successful cycles.
    pub poll_interval: Duration,
    /// Extended pause after a failed cycle.
    pub cooldown: Duration,
    /// Minimum spacing between classification calls.
    pub llm_min_interval: Duration,
    /// What to do when the model's answer matches no category.
    pub fallback: FallbackPolicy,
    /// Optional remote rules source; `None` means local-only rules.
    pub remote_rules: Option<RemoteRules>,
}

impl TriageConfig {
    /// Build configuration from environment variables, with defaults.
    pub fn from_env() -> Self {
        let config_dir = std::env::var("TRIAGE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".inbox-triage")
            });

        let model = std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let poll_interval_secs: u64 = std::env::var("TRIAGE_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let cooldown_secs: u64 = std::env::var("TRIAGE_COOLDOWN_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let llm_min_interval_ms: u64 = std::env::var("TRIAGE_LLM_MIN_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);

        let fallback = std::env::var("TRIAGE_FALLBACK")
            .ok()
            .and_then(|s| FallbackPolicy::from_config_value(&s))
            .unwrap_or_default();

        // Both halves of the pair are required; otherwise rules stay local.
        let remote_rules = match (
            std::env::var("RULES_REPO"),
            std::env::var("RULES_REPO_TOKEN"),
        ) {
            (Ok(repo), Ok(token)) if !repo.is_empty() && !token.is_empty() => Some(RemoteRules {
                repo,
                token: SecretString::from(token),
            }),
            _ => None,
        };

        Self {
            config_dir,
            model,
            poll_interval: Duration::from_secs(poll_interval_secs),
            cooldown: Duration::from_secs(cooldown_secs),
            llm_min_interval: Duration::from_millis(llm_min_interval_ms),
            fallback,
            remote_rules,
        }
    }

    /// Path of the JSONL audit log.
    pub fn audit_log_path(&self) -> PathBuf {
        self.config_dir.join("classifications.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_lives_in_config_dir() {
        let config = TriageConfig {
            config_dir: PathBuf::from("/tmp/triage"),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_secs(60),
            cooldown: Duration::from_secs(300),
            llm_min_interval: Duration::from_millis(1000),
            fallback: FallbackPolicy::default(),
            remote_rules: None,
        };
        assert_eq!(
            config.audit_log_path(),
            PathBuf::from("/tmp/triage/classifications.jsonl")
        );
    }
}
