use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use super::channel::Content;
use super::client::SlackApi;
use super::store::EntityStore;
use crate::errors::SlackError;

/// A Slack user. Equality and hashing use the id only, so a `User` built
/// from an id and one built from a full bundle compare equal.
#[derive(Debug, Clone)]
pub struct User {
    id: String,
    data: Option<Arc<Value>>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
        }
    }

    /// Build a user from a pre-fetched `users.info` user bundle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the bundle has no `id`.
    pub fn from_data(data: Value) -> Result<Self, SlackError> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SlackError::InvalidRequest("Must provide ID or details".to_string()))?
            .to_string();

        Ok(Self {
            id,
            data: Some(Arc::new(data)),
        })
    }

    /// Build a user from a whole Web API response (`{"ok": true, "user": {...}}`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` unless the response is `ok` and carries a user.
    pub fn from_response(response: &Value) -> Result<Self, SlackError> {
        if !response.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            return Err(SlackError::ApiError("Failed Request".to_string()));
        }
        let user = response
            .get("user")
            .cloned()
            .ok_or_else(|| SlackError::ApiError("Failed Request".to_string()))?;
        Self::from_data(user)
    }

    /// Find a user by chat handle, with or without the leading `@`.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn find_by_handle(api: &dyn SlackApi, handle: &str) -> Result<Self, SlackError> {
        let handle = if handle.starts_with('@') {
            handle.to_string()
        } else {
            format!("@{handle}")
        };
        Self::from_response(&api.users_info(&handle).await?)
    }

    /// Requires the `users:read.email` scope on the bot token.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn find_by_email(api: &dyn SlackApi, email: &str) -> Result<Self, SlackError> {
        Self::from_response(&api.users_lookup_by_email(email).await?)
    }

    /// Resolve the user named by unescaped mention text such as `@U123`.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn from_mention(api: &dyn SlackApi, mention: &str) -> Result<Self, SlackError> {
        let id = mention
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_start_matches('@');
        Self::from_response(&api.users_info(id).await?)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The token that mentions this user in message text.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Attribute snapshot, either the one this user was built with or the
    /// cached profile.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a cache miss.
    pub async fn profile(&self, store: &EntityStore) -> Result<UserProfile, SlackError> {
        match &self.data {
            Some(data) => Ok(UserProfile::new(Value::clone(data))),
            None => Ok(UserProfile::new(store.user_data(&self.id).await?)),
        }
    }

    /// Send a direct message. Slack accepts a user id as the channel.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for empty content, or a Slack API failure.
    pub async fn dm(&self, store: &EntityStore, content: Content) -> Result<Value, SlackError> {
        store
            .api()
            .chat_post_message(&content.into_post(&self.id))
            .await
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Immutable snapshot of a user's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    data: Value,
}

impl UserProfile {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.data
            .get("is_bot")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The configured display name for bots, the username for everyone else.
    #[must_use]
    pub fn handle(&self) -> Option<&str> {
        let field = if self.is_bot() { "real_name" } else { "name" };
        self.str_field(field)
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Value> {
        self.data.get("profile")
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.profile()?.get("email")?.as_str()
    }

    /// Status text; may be stale since profiles are cached for the process lifetime.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.profile()?.get("status_text")?.as_str()
    }

    #[must_use]
    pub fn tz(&self) -> Option<&str> {
        self.str_field("tz")
    }

    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.str_field("team_id")
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.data
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}
