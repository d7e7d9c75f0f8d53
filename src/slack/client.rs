//! Slack API client module
//!
//! The `SlackApi` trait is the platform collaborator the entity model and
//! dispatcher talk to. `SlackClient` is the production implementation, with
//! retry on transport failures.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::{SlackApiToken, SlackApiTokenValue};
use std::time::Duration;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::core::config::DEFAULT_SLACK_API_BASE_URL;
use crate::errors::SlackError;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a SlackError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Page size requested from `conversations.members`.
const MEMBERS_PAGE_LIMIT: &str = "200";

/// A `chat.postMessage` request. Optional fields are left off the wire when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostMessage {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl PostMessage {
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }

    #[must_use]
    pub fn with_blocks(mut self, blocks: Value) -> Self {
        self.blocks = Some(blocks);
        self
    }

    #[must_use]
    pub fn in_thread(mut self, thread_ts: Option<impl Into<String>>) -> Self {
        self.thread_ts = thread_ts.map(Into::into);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidRequest` when there is no channel, or when none of
    /// text, attachments or blocks carries content.
    pub fn validate(&self) -> Result<(), SlackError> {
        if self.channel.is_empty() {
            return Err(SlackError::InvalidRequest(
                "message has no destination channel".to_string(),
            ));
        }

        let has_text = self.text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if has_text || has_content(self.attachments.as_ref()) || has_content(self.blocks.as_ref()) {
            Ok(())
        } else {
            Err(SlackError::InvalidRequest(
                "message needs text, attachments or blocks".to_string(),
            ))
        }
    }
}

fn has_content(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Slack Web API operations used by this crate.
///
/// Lookups return the raw response bundle so callers can snapshot whatever
/// attributes they need.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `auth.test` for the bot token; the bundle carries `user_id` and,
    /// for bot tokens, `bot_id`.
    async fn auth_test(&self) -> Result<Value, SlackError>;

    /// `conversations.info`; `channel` is an id or a `#name`.
    async fn conversations_info(&self, channel: &str) -> Result<Value, SlackError>;

    /// Every member id of the conversation, across all pages.
    async fn conversations_members(&self, channel: &str) -> Result<Vec<String>, SlackError>;

    async fn chat_post_message(&self, message: &PostMessage) -> Result<Value, SlackError>;

    async fn reactions_add(
        &self,
        channel: &str,
        name: &str,
        timestamp: &str,
    ) -> Result<(), SlackError>;

    /// `users.info`; `user` is an id or an `@handle`.
    async fn users_info(&self, user: &str) -> Result<Value, SlackError>;

    async fn users_lookup_by_email(&self, email: &str) -> Result<Value, SlackError>;
}

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    token: SlackApiToken,
    base_url: String,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_SLACK_API_BASE_URL)
    }

    /// Point the Web API calls at another host. `auth.test` still goes
    /// through the slack-morphism session unless the base URL is overridden.
    #[must_use]
    pub fn with_base_url(token: String, base_url: &str) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &SlackApiToken {
        &self.token
    }

    // Only transport failures are retried; Slack-level errors are final.
    // Reads only; see `call_json`.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SlackError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SlackError>> + Send,
        T: Send,
    {
        // 100ms, 200ms, 400ms; the webhook answers synchronously
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(3);

        RetryIf::start(strategy, operation, |e: &SlackError| {
            matches!(e, SlackError::HttpError(_))
        })
        .await
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn read_body(method: &str, resp: reqwest::Response) -> Result<Value, SlackError> {
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(SlackError::HttpError(format!("{method} HTTP {status}")));
        }
        if !status.is_success() {
            return Err(SlackError::ApiError(format!("{method} HTTP {status}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SlackError::ApiError(format!("{method} JSON parse error: {e}")))?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            return Err(SlackError::ApiError(format!(
                "{method} error: {}",
                body.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
            )));
        }

        Ok(body)
    }

    /// Form-encoded call, accepted by every Web API method including the read ones.
    async fn call_form(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, SlackError> {
        self.with_retry(|| async {
            debug!(slack_method = %method, "Calling Slack API");
            let resp = HTTP_CLIENT
                .post(self.url(method))
                .bearer_auth(&self.token.token_value.0)
                .form(params)
                .send()
                .await
                .map_err(|e| SlackError::HttpError(format!("{method}: {e}")))?;

            Self::read_body(method, resp).await
        })
        .await
    }

    /// Single attempt: a write that failed after reaching Slack may already
    /// have taken effect, so it is never replayed.
    async fn call_json(&self, method: &str, payload: &Value) -> Result<Value, SlackError> {
        debug!(slack_method = %method, "Calling Slack API");
        let resp = HTTP_CLIENT
            .post(self.url(method))
            .bearer_auth(&self.token.token_value.0)
            .json(payload)
            .send()
            .await
            .map_err(|e| SlackError::HttpError(format!("{method}: {e}")))?;

        Self::read_body(method, resp).await
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn auth_test(&self) -> Result<Value, SlackError> {
        if self.base_url != DEFAULT_SLACK_API_BASE_URL {
            return self.call_form("auth.test", &[]).await;
        }

        self.with_retry(|| async {
            let session = SLACK_CLIENT
                .as_ref()
                .ok_or_else(|| {
                    SlackError::HttpError("Slack HTTP connector not initialized".to_string())
                })?
                .open_session(&self.token);

            let test_resp = session.auth_test().await?;

            Ok(json!({
                "ok": true,
                "user_id": test_resp.user_id.0,
                "bot_id": test_resp.bot_id.map(|id| id.0),
            }))
        })
        .await
    }

    async fn conversations_info(&self, channel: &str) -> Result<Value, SlackError> {
        self.call_form("conversations.info", &[("channel", channel)])
            .await
    }

    async fn conversations_members(&self, channel: &str) -> Result<Vec<String>, SlackError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let page = self
                .call_form(
                    "conversations.members",
                    &[
                        ("cursor", cursor.as_str()),
                        ("channel", channel),
                        ("limit", MEMBERS_PAGE_LIMIT),
                    ],
                )
                .await?;

            if let Some(ids) = page.get("members").and_then(Value::as_array) {
                members.extend(ids.iter().filter_map(Value::as_str).map(ToString::to_string));
            }

            match page
                .get("response_metadata")
                .and_then(|m| m.get("next_cursor"))
                .and_then(Value::as_str)
            {
                Some(next) if !next.is_empty() => cursor = next.to_string(),
                _ => break,
            }
        }

        Ok(members)
    }

    async fn chat_post_message(&self, message: &PostMessage) -> Result<Value, SlackError> {
        message.validate()?;
        let payload = serde_json::to_value(message)?;
        self.call_json("chat.postMessage", &payload).await
    }

    async fn reactions_add(
        &self,
        channel: &str,
        name: &str,
        timestamp: &str,
    ) -> Result<(), SlackError> {
        let payload = json!({
            "channel": channel,
            "name": name.trim_matches(':'),
            "timestamp": timestamp,
        });
        self.call_json("reactions.add", &payload).await?;
        Ok(())
    }

    async fn users_info(&self, user: &str) -> Result<Value, SlackError> {
        self.call_form("users.info", &[("user", user)]).await
    }

    async fn users_lookup_by_email(&self, email: &str) -> Result<Value, SlackError> {
        self.call_form("users.lookupByEmail", &[("email", email)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_message_requires_content() {
        let err = PostMessage::new("C1").validate().unwrap_err();
        assert!(matches!(err, SlackError::InvalidRequest(_)));

        let blank = PostMessage::new("C1")
            .with_text("   ")
            .with_blocks(json!([]));
        assert!(blank.validate().is_err());

        assert!(PostMessage::new("C1").with_text("hi").validate().is_ok());
        assert!(
            PostMessage::new("C1")
                .with_blocks(json!([{"type": "divider"}]))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_post_message_requires_channel() {
        let err = PostMessage::new("").with_text("hi").validate().unwrap_err();
        assert!(matches!(err, SlackError::InvalidRequest(_)));
    }

    #[test]
    fn test_post_message_omits_unset_fields() {
        let payload = serde_json::to_value(
            PostMessage::new("C1")
                .with_text("hello")
                .in_thread(Some("1234567.89")),
        )
        .unwrap();

        assert_eq!(payload["channel"], "C1");
        assert_eq!(payload["text"], "hello");
        assert_eq!(payload["thread_ts"], "1234567.89");
        assert!(payload.get("blocks").is_none());
        assert!(payload.get("attachments").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = SlackClient::with_base_url("xoxb-test".to_string(), "http://localhost:1/api/");
        assert_eq!(client.url("users.info"), "http://localhost:1/api/users.info");
    }
}
