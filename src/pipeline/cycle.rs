//! One triage cycle: fetch → skip-check → classify → label → log.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::audit::{AuditLog, AuditRecord};
use crate::error::{PipelineError, RulesError};
use crate::labels::{self, CategoryLabelMap};
use crate::llm::{Classification, Classifier};
use crate::mailbox::Mailbox;
use crate::rules::RuleSet;
use crate::rules::loader::RulesStore;

/// Terminal state for one processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Matched a skip rule or already carried a category label.
    Skipped { reason: String },
    /// The classifier reported no decision; left unlabeled for manual review.
    Undecided,
    /// Labeled and recorded in the audit log.
    Labeled { category: String },
}

impl MessageOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Undecided => "undecided",
            Self::Labeled { .. } => "labeled",
        }
    }
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub candidates: usize,
    pub labeled: usize,
    pub skipped: usize,
    pub undecided: usize,
    pub failed: usize,
}

/// Drives one full pass over the current candidate messages.
///
/// The rule set and label map are rebuilt fresh at the start of every cycle
/// and stay read-only for its duration.
pub struct TriageCycle {
    mailbox: Arc<dyn Mailbox>,
    classifier: Classifier,
    rules: RulesStore,
    audit: AuditLog,
}

impl TriageCycle {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        classifier: Classifier,
        rules: RulesStore,
        audit: AuditLog,
    ) -> Self {
        Self {
            mailbox,
            classifier,
            rules,
            audit,
        }
    }

    /// Run one cycle over all current candidates.
    ///
    /// Per-message failures are contained here; an error return means the
    /// cycle itself could not run (rules, reconciliation, or listing failed).
    pub async fn run_cycle(&self) -> Result<CycleStats, PipelineError> {
        let document = self.rules.load().await?;
        let ruleset = RuleSet::parse(&document)?;
        if ruleset.categories.is_empty() {
            return Err(RulesError::NoCategories.into());
        }

        let label_map = labels::reconcile(self.mailbox.as_ref(), &ruleset.categories).await?;

        let exclude: Vec<String> = ruleset
            .categories
            .iter()
            .map(|c| labels::label_name(c))
            .collect();
        let candidates = self.mailbox.list_candidates(&exclude).await?;

        let mut stats = CycleStats {
            candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            info!("No new emails to process");
            return Ok(stats);
        }

        info!(count = candidates.len(), "Processing unread emails");

        for stub in &candidates {
            match self
                .process_message(&stub.id, &ruleset, &document, &label_map)
                .await
            {
                Ok(MessageOutcome::Labeled { .. }) => stats.labeled += 1,
                Ok(MessageOutcome::Skipped { .. }) => stats.skipped += 1,
                Ok(MessageOutcome::Undecided) => stats.undecided += 1,
                Err(e) => {
                    // One bad message never aborts the cycle.
                    error!(id = %stub.id, error = %e, "Error processing message");
                    stats.failed += 1;
                }
            }
        }

        info!(
            labeled = stats.labeled,
            skipped = stats.skipped,
            undecided = stats.undecided,
            failed = stats.failed,
            "Cycle complete"
        );
        Ok(stats)
    }

    /// Process a single candidate to its terminal state.
    async fn process_message(
        &self,
        id: &str,
        ruleset: &RuleSet,
        document: &str,
        label_map: &CategoryLabelMap,
    ) -> Result<MessageOutcome, PipelineError> {
        let email = self.mailbox.fetch_detail(id).await?;

        // The list query already excludes category labels, but the detail is
        // authoritative; don't label twice.
        if email
            .label_ids
            .iter()
            .any(|label_id| label_map.values().any(|v| v == label_id))
        {
            debug!(id = %email.id, "Message already bears a category label");
            return Ok(MessageOutcome::Skipped {
                reason: "already labeled".to_string(),
            });
        }

        if let Some(rule) = ruleset.should_skip(&email.sender, &email.subject) {
            info!(
                id = %email.id,
                field = rule.field.as_str(),
                pattern = %rule.pattern,
                "Skipping message per skip rule"
            );
            return Ok(MessageOutcome::Skipped {
                reason: format!("{}:{}", rule.field.as_str(), rule.pattern),
            });
        }

        let (category, rationale) =
            match self.classifier.classify(&email, ruleset, document).await? {
                Classification::Decided {
                    category,
                    rationale,
                } => (category, rationale),
                Classification::Undecided => {
                    warn!(
                        id = %email.id,
                        "No decision; leaving message unlabeled for manual review"
                    );
                    return Ok(MessageOutcome::Undecided);
                }
            };

        let label_id = label_map
            .get(&category)
            .ok_or_else(|| PipelineError::MissingLabel(category.clone()))?;
        self.mailbox.apply_label(&email.id, label_id, true).await?;

        self.audit
            .append(&AuditRecord::new(
                &email.id,
                &email.subject,
                &email.sender,
                &email.recipient,
                &category,
                &rationale,
            ))
            .await?;

        info!(
            id = %email.id,
            subject = %preview(&email.subject, 50),
            category = %category,
            rationale = %rationale,
            "Classified message"
        );
        Ok(MessageOutcome::Labeled { category })
    }
}

/// Truncate a string to `max_chars` for log lines.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(
            MessageOutcome::Skipped { reason: "x".into() }.label(),
            "skipped"
        );
        assert_eq!(MessageOutcome::Undecided.label(), "undecided");
        assert_eq!(
            MessageOutcome::Labeled {
                category: "Important".into()
            }
            .label(),
            "labeled"
        );
    }

    #[test]
    fn preview_truncates_long_subjects() {
        assert_eq!(preview("short", 50), "short");
        let long = "a".repeat(60);
        let shown = preview(&long, 50);
        assert_eq!(shown.chars().count(), 53);
        assert!(shown.ends_with("..."));
    }
}
