//! Mailbox collaborator — pure I/O, no decision logic.
//!
//! The pipeline talks to the mailbox through the [`Mailbox`] trait; the one
//! real implementation is Gmail over REST ([`gmail`]). Tests substitute an
//! in-memory fake.

pub mod auth;
pub mod gmail;

pub use auth::{GmailAuthenticator, GmailCredentials};
pub use gmail::GmailMailbox;

use async_trait::async_trait;

use crate::error::MailboxError;

/// A listed candidate before its detail has been fetched.
#[derive(Debug, Clone)]
pub struct MessageStub {
    pub id: String,
}

/// A fetched inbox item, never mutated after construction.
#[derive(Debug, Clone)]
pub struct CandidateMessage {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub recipient: String,
    /// First 300 characters of the plaintext body, or empty.
    pub body_preview: String,
    /// Label ids already on the message.
    pub label_ids: Vec<String>,
}

/// A label in the mailbox's label namespace.
#[derive(Debug, Clone)]
pub struct MailboxLabel {
    pub id: String,
    pub name: String,
}

/// Operations the pipeline needs from a mailbox.
///
/// Applying the same label twice has no extra effect; implementations are
/// expected to be idempotent at that level.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// List unread messages in the primary inbox view, excluding any
    /// already bearing one of `exclude_labels` (label names).
    async fn list_candidates(
        &self,
        exclude_labels: &[String],
    ) -> Result<Vec<MessageStub>, MailboxError>;

    /// Fetch full detail for one message.
    async fn fetch_detail(&self, id: &str) -> Result<CandidateMessage, MailboxError>;

    /// List all labels.
    async fn list_labels(&self) -> Result<Vec<MailboxLabel>, MailboxError>;

    /// Create a label with default visibility settings.
    async fn create_label(&self, name: &str) -> Result<MailboxLabel, MailboxError>;

    /// Apply a label to a message; when `archive` is set, also remove the
    /// inbox marker.
    async fn apply_label(
        &self,
        message_id: &str,
        label_id: &str,
        archive: bool,
    ) -> Result<(), MailboxError>;
}
