//! Gmail REST implementation of the [`Mailbox`] trait.
//!
//! Thin wrappers over `gmail.googleapis.com/gmail/v1/users/me`: message
//! list/get, label list/create, message modify. Every call authenticates
//! with a bearer token from [`GmailAuthenticator`].

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::MailboxError;
use crate::mailbox::auth::{GmailAuthenticator, GmailCredentials};
use crate::mailbox::{CandidateMessage, Mailbox, MailboxLabel, MessageStub};

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Body preview length, in characters.
const BODY_PREVIEW_CHARS: usize = 300;

/// Upper bound on candidates fetched per cycle.
const LIST_MAX_RESULTS: u32 = 100;

/// Gmail mailbox client.
pub struct GmailMailbox {
    auth: GmailAuthenticator,
    client: reqwest::Client,
}

impl GmailMailbox {
    pub fn new(credentials: GmailCredentials) -> Self {
        let client = reqwest::Client::new();
        Self {
            auth: GmailAuthenticator::new(credentials, client.clone()),
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, MailboxError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;
        check_response(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &serde_json::Value,
    ) -> Result<T, MailboxError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;
        check_response(response).await
    }
}

async fn check_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, MailboxError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(MailboxError::AuthFailed {
            reason: format!("mailbox API returned HTTP {}", status.as_u16()),
        });
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(MailboxError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| MailboxError::InvalidResponse(e.to_string()))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    body: Option<PartBody>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<GmailLabel>,
}

#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

// ── Parsing helpers ─────────────────────────────────────────────────

/// Build the candidate search query: unread, in the inbox, not already
/// bearing any of the given labels.
fn build_query(exclude_labels: &[String]) -> String {
    let mut query = String::from("is:unread in:inbox");
    for name in exclude_labels {
        query.push_str(&format!(" -label:\"{name}\""));
    }
    query
}

fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Decode Gmail's base64url body data (padded or not) into lossy UTF-8.
fn decode_body(data: &str) -> String {
    let bytes = URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Extract the plaintext body preview: the top-level body if present, else
/// the first `text/plain` part; empty when neither exists.
fn body_preview(payload: &MessagePayload) -> String {
    let body = if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
        decode_body(data)
    } else if let Some(data) = payload
        .parts
        .iter()
        .find(|p| p.mime_type == "text/plain")
        .and_then(|p| p.body.as_ref())
        .and_then(|b| b.data.as_deref())
    {
        decode_body(data)
    } else {
        String::new()
    };

    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

fn to_candidate(message: GmailMessage) -> CandidateMessage {
    let (subject, sender, recipient, preview) = match message.payload {
        Some(ref payload) => (
            header_value(&payload.headers, "Subject"),
            header_value(&payload.headers, "From"),
            header_value(&payload.headers, "To"),
            body_preview(payload),
        ),
        None => Default::default(),
    };

    CandidateMessage {
        id: message.id,
        subject,
        sender,
        recipient,
        body_preview: preview,
        label_ids: message.label_ids,
    }
}

// ── Mailbox impl ────────────────────────────────────────────────────

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn list_candidates(
        &self,
        exclude_labels: &[String],
    ) -> Result<Vec<MessageStub>, MailboxError> {
        let query = build_query(exclude_labels);
        debug!(query = %query, "Listing candidate messages");

        let list: MessageList = self
            .get_json(
                format!("{BASE_URL}/messages"),
                &[
                    ("q", query),
                    ("maxResults", LIST_MAX_RESULTS.to_string()),
                ],
            )
            .await?;

        Ok(list
            .messages
            .into_iter()
            .map(|m| MessageStub { id: m.id })
            .collect())
    }

    async fn fetch_detail(&self, id: &str) -> Result<CandidateMessage, MailboxError> {
        let message: GmailMessage = self
            .get_json(
                format!("{BASE_URL}/messages/{id}"),
                &[("format", "full".to_string())],
            )
            .await?;
        Ok(to_candidate(message))
    }

    async fn list_labels(&self) -> Result<Vec<MailboxLabel>, MailboxError> {
        let list: LabelList = self.get_json(format!("{BASE_URL}/labels"), &[]).await?;
        Ok(list
            .labels
            .into_iter()
            .map(|l| MailboxLabel {
                id: l.id,
                name: l.name,
            })
            .collect())
    }

    async fn create_label(&self, name: &str) -> Result<MailboxLabel, MailboxError> {
        let body = serde_json::json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        let label: GmailLabel = self.post_json(format!("{BASE_URL}/labels"), &body).await?;
        Ok(MailboxLabel {
            id: label.id,
            name: label.name,
        })
    }

    async fn apply_label(
        &self,
        message_id: &str,
        label_id: &str,
        archive: bool,
    ) -> Result<(), MailboxError> {
        let remove: Vec<&str> = if archive { vec!["INBOX"] } else { vec![] };
        let body = serde_json::json!({
            "addLabelIds": [label_id],
            "removeLabelIds": remove,
        });
        // The modify response echoes the message; only the status matters.
        let _: serde_json::Value = self
            .post_json(format!("{BASE_URL}/messages/{message_id}/modify"), &body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        URL_SAFE.encode(text.as_bytes())
    }

    #[test]
    fn query_excludes_labels() {
        let query = build_query(&["Triage/Important".into(), "Triage/Optional".into()]);
        assert_eq!(
            query,
            "is:unread in:inbox -label:\"Triage/Important\" -label:\"Triage/Optional\""
        );
    }

    #[test]
    fn query_without_exclusions() {
        assert_eq!(build_query(&[]), "is:unread in:inbox");
    }

    #[test]
    fn candidate_from_full_message() {
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "labelIds": ["UNREAD", "INBOX"],
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Your receipt"},
                    {"name": "From", "value": "store@example.com"},
                    {"name": "To", "value": "me@example.com"},
                ],
                "body": {"size": 20, "data": encode("Thanks for ordering.")},
            },
        }))
        .unwrap();

        let candidate = to_candidate(message);
        assert_eq!(candidate.id, "m-1");
        assert_eq!(candidate.subject, "Your receipt");
        assert_eq!(candidate.sender, "store@example.com");
        assert_eq!(candidate.recipient, "me@example.com");
        assert_eq!(candidate.body_preview, "Thanks for ordering.");
        assert_eq!(candidate.label_ids, vec!["UNREAD", "INBOX"]);
    }

    #[test]
    fn candidate_prefers_text_plain_part() {
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "m-2",
            "payload": {
                "headers": [],
                "parts": [
                    {"mimeType": "text/html", "body": {"data": encode("<p>hi</p>")}},
                    {"mimeType": "text/plain", "body": {"data": encode("hi there")}},
                ],
            },
        }))
        .unwrap();

        assert_eq!(to_candidate(message).body_preview, "hi there");
    }

    #[test]
    fn body_preview_is_truncated_to_300_chars() {
        let long = "x".repeat(500);
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "m-3",
            "payload": {
                "headers": [],
                "body": {"data": encode(&long)},
            },
        }))
        .unwrap();

        assert_eq!(to_candidate(message).body_preview.chars().count(), 300);
    }

    #[test]
    fn missing_body_yields_empty_preview() {
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "m-4",
            "payload": {"headers": [{"name": "Subject", "value": "No body"}]},
        }))
        .unwrap();

        let candidate = to_candidate(message);
        assert_eq!(candidate.subject, "No body");
        assert_eq!(candidate.body_preview, "");
    }

    #[test]
    fn decodes_unpadded_base64url() {
        // "hello" without padding.
        assert_eq!(decode_body("aGVsbG8"), "hello");
        // And with padding.
        assert_eq!(decode_body("aGVsbG8="), "hello");
    }

    #[test]
    fn empty_message_list_deserializes() {
        let list: MessageList = serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        assert!(list.messages.is_empty());
    }
}
