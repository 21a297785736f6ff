//! Classifier — turns one email plus the active rules into a category.
//!
//! Builds a single prompt (category list, full rules document as the
//! definitions, message fields), makes one paced provider call, and parses
//! the fixed `"<CATEGORY>: <brief reason>"` response line.
//!
//! Two outcomes are deliberately distinct:
//! - an *ambiguous response* (no category prefix) resolves through the
//!   configured [`FallbackPolicy`], deterministically;
//! - a *call failure* propagates as `Err` — it is never converted into a
//!   fallback classification.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::warn;

use crate::error::LlmError;
use crate::llm::CompletionProvider;
use crate::mailbox::CandidateMessage;
use crate::rules::RuleSet;

/// Max output tokens for a classification call (one line of response).
const CLASSIFY_MAX_TOKENS: u32 = 150;

/// Rationale recorded when the fallback picks the first category.
const FALLBACK_RATIONALE: &str = "Uncertain response; defaulted to the first category";

/// What to do when the model's response matches no known category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fail open: classify as the first category in document order.
    #[default]
    FirstCategory,
    /// Fail closed: report no decision and leave the message unlabeled.
    NoDecision,
}

impl FallbackPolicy {
    /// Parse a configuration value (`first` / `none`).
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "first" => Some(Self::FirstCategory),
            "none" => Some(Self::NoDecision),
            _ => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstCategory => "first-category",
            Self::NoDecision => "no-decision",
        }
    }
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The model named a known category.
    Decided { category: String, rationale: String },
    /// No decision could be made; the message stays unlabeled.
    Undecided,
}

/// Classifier over a completion provider, with inter-call pacing.
pub struct Classifier {
    provider: Arc<dyn CompletionProvider>,
    fallback: FallbackPolicy,
    /// Minimum spacing between provider calls. A property of this
    /// component, not its callers.
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Classifier {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        fallback: FallbackPolicy,
        min_interval: Duration,
    ) -> Self {
        Self {
            provider,
            fallback,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Classify one message against the active rule set.
    ///
    /// `document` is the full rules text the rule set was parsed from; it is
    /// embedded in the prompt as the category definitions.
    pub async fn classify(
        &self,
        message: &CandidateMessage,
        ruleset: &RuleSet,
        document: &str,
    ) -> Result<Classification, LlmError> {
        let prompt = build_prompt(message, &ruleset.categories, document);

        self.pace().await;
        let response = self.provider.complete(&prompt, CLASSIFY_MAX_TOKENS).await?;

        match parse_category_line(&response, &ruleset.categories) {
            Some((category, rationale)) => Ok(Classification::Decided {
                category,
                rationale,
            }),
            None => {
                warn!(
                    id = %message.id,
                    raw_response = %response,
                    policy = self.fallback.label(),
                    "Response matched no category; applying fallback policy"
                );
                Ok(self.apply_fallback(&ruleset.categories))
            }
        }
    }

    fn apply_fallback(&self, categories: &[String]) -> Classification {
        match self.fallback {
            FallbackPolicy::FirstCategory => match categories.first() {
                Some(first) => Classification::Decided {
                    category: first.clone(),
                    rationale: FALLBACK_RATIONALE.to_string(),
                },
                None => Classification::Undecided,
            },
            FallbackPolicy::NoDecision => Classification::Undecided,
        }
    }

    /// Sleep until `min_interval` has passed since the previous call.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the classification prompt for one message.
fn build_prompt(message: &CandidateMessage, categories: &[String], document: &str) -> String {
    let category_list = categories.join(", ");

    let mut prompt = String::with_capacity(document.len() + 512);
    prompt.push_str(&format!(
        "Analyze this email and classify it into exactly one of these categories: {category_list}.\n\n"
    ));
    prompt.push_str("Category definitions:\n\n");
    prompt.push_str(document);
    prompt.push_str("\n\nEmail Details:\n");
    prompt.push_str(&format!("Subject: {}\n", message.subject));
    prompt.push_str(&format!("From: {}\n", message.sender));
    prompt.push_str(&format!("To: {}\n", message.recipient));
    prompt.push_str(&format!("Body: {}\n", message.body_preview));
    prompt.push_str(&format!(
        "\nRespond with EXACTLY one line in this format:\n\
         <CATEGORY>: [brief reason]\n\n\
         where <CATEGORY> is one of: {category_list} (verbatim)."
    ));

    prompt
}

// ── Response parsing ────────────────────────────────────────────────

/// Match the response against `"<category>:"` prefixes in document order.
///
/// The first category whose token prefixes the trimmed response wins; the
/// rationale is the remainder with the prefix stripped and trimmed. The
/// match is case-sensitive against the category token.
fn parse_category_line(raw: &str, categories: &[String]) -> Option<(String, String)> {
    let trimmed = raw.trim();
    for category in categories {
        if let Some(rest) = trimmed.strip_prefix(&format!("{category}:")) {
            return Some((category.clone(), rest.trim().to_string()));
        }
    }
    None
}
