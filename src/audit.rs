//! Append-only JSONL audit log of classification decisions.
//!
//! One record per labeled message. Records are never rewritten or
//! compacted; this file is the durable answer to "what was decided and
//! why" long after the tracing output is gone.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One classification decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub email_id: String,
    pub subject: String,
    pub sender: String,
    pub recipient: String,
    pub classification: String,
    pub reasoning: String,
}

impl AuditRecord {
    pub fn new(
        email_id: &str,
        subject: &str,
        sender: &str,
        recipient: &str,
        classification: &str,
        reasoning: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            email_id: email_id.to_string(),
            subject: subject.to_string(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            classification: classification.to_string(),
            reasoning: reasoning.to_string(),
        }
    }
}

/// Appender for the JSONL audit log.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line.
    pub async fn append(&self, record: &AuditRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("classifications.jsonl"));

        log.append(&AuditRecord::new(
            "m-1",
            "Your receipt",
            "store@example.com",
            "me@example.com",
            "Important",
            "transactional receipt",
        ))
        .await
        .unwrap();
        log.append(&AuditRecord::new(
            "m-2",
            "Weekly deals",
            "promo@example.com",
            "me@example.com",
            "Optional",
            "marketing campaign",
        ))
        .await
        .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.email_id, "m-1");
        assert_eq!(first.classification, "Important");

        let second: AuditRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.sender, "promo@example.com");
        assert_eq!(second.reasoning, "marketing campaign");
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("nested/dir/audit.jsonl"));

        log.append(&AuditRecord::new("m-1", "s", "a@b.c", "d@e.f", "X", "r"))
            .await
            .unwrap();
        assert!(log.path().exists());
    }
}
