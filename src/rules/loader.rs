//! Rules document loading — local cache with optional remote refresh.
//!
//! The document lives at `<config dir>/rules.md`. On first run a built-in
//! default is written there so the user has something to edit. When a remote
//! source is configured, each load tries the remote first and overwrites the
//! local cache on success; any fetch failure falls back to the cache without
//! failing the run.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tokio::fs;
use tracing::{info, warn};

use crate::error::RulesError;

/// Built-in rules document, seeded on first run.
pub const DEFAULT_RULES: &str = "\
Important emails include:
- Transactional: receipts, confirmations, invoices, shipping notifications
- Security: password resets, security alerts, 2FA codes
- Personal: real people asking questions, replies in conversations
- Work: emails from colleagues, project-related messages
- Action required: needs response, decision, or follow-up

Routine emails include:
- Monthly statements, account notifications, balance updates
- Automated confirmations that don't need action
- Regular account activity summaries

Optional emails include:
- Promotional: sales, deals, marketing campaigns
- Newsletters: regular updates, digests, subscriptions
- Notifications: social media, app updates, automated alerts
- Bulk: templated content, mass emails

Skip classification for:
- from:example@example.com
- subject:Example subject to skip";

/// A remote rules source: a GitHub repository holding `rules.md` at its root.
#[derive(Debug, Clone)]
pub struct RemoteRules {
    /// `owner/repo` reference.
    pub repo: String,
    /// Access token for the raw-content fetch.
    pub token: SecretString,
}

/// Loads the rules document from disk, optionally refreshed from a remote.
pub struct RulesStore {
    path: PathBuf,
    remote: Option<RemoteRules>,
    client: reqwest::Client,
}

impl RulesStore {
    /// Create a store rooted at `config_dir` (document at `rules.md`).
    pub fn new(config_dir: &Path, remote: Option<RemoteRules>) -> Self {
        Self {
            path: config_dir.join("rules.md"),
            remote,
            client: reqwest::Client::new(),
        }
    }

    /// Load the current rules document.
    ///
    /// Remote-first when configured; any remote failure falls back to the
    /// local cache with a warning. Never fails because of the remote.
    pub async fn load(&self) -> Result<String, RulesError> {
        if let Some(ref remote) = self.remote {
            match self.fetch_remote(remote).await {
                Ok(document) => {
                    if let Err(e) = self.write_local(&document).await {
                        warn!(error = %e, "Failed to update local rules cache");
                    }
                    return Ok(document);
                }
                Err(e) => {
                    warn!(
                        repo = %remote.repo,
                        error = %e,
                        "Remote rules fetch failed; using local cache"
                    );
                }
            }
        }
        self.load_local().await
    }

    /// Read the local cache, seeding the default document if missing.
    async fn load_local(&self) -> Result<String, RulesError> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let text = fs::read_to_string(&self.path).await?;
            return Ok(text.trim().to_string());
        }
        self.write_local(DEFAULT_RULES).await?;
        info!(path = %self.path.display(), "Wrote default rules document");
        Ok(DEFAULT_RULES.to_string())
    }

    async fn write_local(&self, document: &str) -> Result<(), RulesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, document).await?;
        Ok(())
    }

    /// Fetch `rules.md` from the repository's default branch.
    async fn fetch_remote(&self, remote: &RemoteRules) -> Result<String, String> {
        let url = format!(
            "https://raw.githubusercontent.com/{}/main/rules.md",
            remote.repo
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(remote.token.expose_secret())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }

        let text = response.text().await.map_err(|e| e.to_string())?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::rules::RuleSet;

    #[tokio::test]
    async fn seeds_default_document_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RulesStore::new(dir.path(), None);

        let document = store.load().await.unwrap();
        assert_eq!(document, DEFAULT_RULES);

        // Seeded to disk for the user to edit.
        let on_disk = std::fs::read_to_string(dir.path().join("rules.md")).unwrap();
        assert_eq!(on_disk, DEFAULT_RULES);
    }

    #[tokio::test]
    async fn reads_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rules.md"),
            "Urgent emails include:\n- everything\n",
        )
        .unwrap();

        let store = RulesStore::new(dir.path(), None);
        let document = store.load().await.unwrap();
        assert_eq!(document, "Urgent emails include:\n- everything");
    }

    #[test]
    fn default_document_parses_to_three_categories() {
        let rules = RuleSet::parse(DEFAULT_RULES).unwrap();
        assert_eq!(rules.categories, vec!["Important", "Routine", "Optional"]);
        assert_eq!(rules.skip_rules.len(), 2);
    }
}
