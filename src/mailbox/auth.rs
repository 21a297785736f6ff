//! Gmail OAuth — access tokens from a long-lived refresh token.
//!
//! The interactive consent flow happens once, elsewhere, on a machine with a
//! browser; this process only exchanges the resulting refresh token for
//! short-lived access tokens and caches them until near expiry. A rejected
//! refresh token is fatal for the run — the error carries the remediation.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ConfigError, MailboxError};

/// Google OAuth2 token endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the token actually expires.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// OAuth client credentials plus the user's refresh token.
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl GmailCredentials {
    /// Build credentials from environment variables.
    ///
    /// All three are required; a missing one is a fatal startup condition.
    pub fn from_env() -> Result<Self, ConfigError> {
        let require = |key: &str| {
            std::env::var(key).map_err(|_| ConfigError::MissingEnvVar {
                key: key.to_string(),
                hint: "Run the interactive OAuth consent flow once and export the \
                       resulting credentials."
                    .to_string(),
            })
        };

        Ok(Self {
            client_id: require("GMAIL_CLIENT_ID")?,
            client_secret: SecretString::from(require("GMAIL_CLIENT_SECRET")?),
            refresh_token: SecretString::from(require("GMAIL_REFRESH_TOKEN")?),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Exchanges the refresh token for access tokens, caching until near expiry.
pub struct GmailAuthenticator {
    credentials: GmailCredentials,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GmailAuthenticator {
    pub fn new(credentials: GmailCredentials, client: reqwest::Client) -> Self {
        Self {
            credentials,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing if the cached one is stale.
    pub async fn access_token(&self) -> Result<String, MailboxError> {
        let mut cached = self.cached.lock().await;

        if let Some(ref token) = *cached {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Gmail access token expired; refreshing");
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_BUFFER);
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }

    async fn refresh(&self) -> Result<TokenResponse, MailboxError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                (
                    "client_secret",
                    self.credentials.client_secret.expose_secret(),
                ),
                (
                    "refresh_token",
                    self.credentials.refresh_token.expose_secret(),
                ),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailboxError::AuthFailed {
                reason: format!("token refresh returned HTTP {}: {}", status.as_u16(), body),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| MailboxError::AuthFailed {
                reason: format!("malformed token response: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_deserializes() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.abc","expires_in":3599,"scope":"gmail","token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.abc");
        assert_eq!(token.expires_in, 3599);
    }
}
