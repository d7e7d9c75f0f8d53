use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use super::client::{PostMessage, SlackApi};
use super::store::EntityStore;
use super::user::User;
use crate::errors::SlackError;

/// Content for `Channel::post` and `User::dm`. At least one of text,
/// attachments or blocks has to carry something.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub text: Option<String>,
    pub attachments: Option<Value>,
    pub blocks: Option<Value>,
    /// Thread anchor timestamp to reply under.
    pub thread: Option<String>,
}

impl Content {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn blocks(blocks: Value) -> Self {
        Self {
            blocks: Some(blocks),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }

    #[must_use]
    pub fn in_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }

    #[must_use]
    pub fn into_post(self, channel: &str) -> PostMessage {
        PostMessage {
            channel: channel.to_string(),
            text: self.text,
            attachments: self.attachments,
            blocks: self.blocks,
            thread_ts: self.thread,
        }
    }
}

/// A Slack conversation. Equality and hashing use the id only.
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    data: Option<Arc<Value>>,
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
        }
    }

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

    /// Look a channel up by name, with or without the leading `#`.
    ///
    /// # Errors
    ///
    /// Fails when the channel does not exist or Slack is unreachable.
    pub async fn from_name(api: &dyn SlackApi, name: &str) -> Result<Self, SlackError> {
        let name = if name.starts_with('#') {
            name.to_string()
        } else {
            format!("#{name}")
        };
        let mut response = api.conversations_info(&name).await?;
        let data = response
            .get_mut("channel")
            .map(Value::take)
            .ok_or_else(|| SlackError::ApiError(format!("channel {name} not found")))?;
        Self::from_data(data)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attribute snapshot, either the one this channel was built with or
    /// the cached `conversations.info` bundle.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a cache miss.
    pub async fn info(&self, store: &EntityStore) -> Result<ChannelInfo, SlackError> {
        match &self.data {
            Some(data) => Ok(ChannelInfo::new(Value::clone(data))),
            None => Ok(ChannelInfo::new(store.channel_data(&self.id).await?)),
        }
    }

    /// Channel members ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a cache miss.
    pub async fn members(&self, store: &EntityStore) -> Result<Vec<User>, SlackError> {
        Ok(store
            .channel_member_ids(&self.id)
            .await?
            .into_iter()
            .map(User::new)
            .collect())
    }

    /// Whether this is a direct-message conversation.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a cache miss.
    pub async fn is_private(&self, store: &EntityStore) -> Result<bool, SlackError> {
        Ok(self.info(store).await?.is_private())
    }

    /// # Errors
    ///
    /// Returns `InvalidRequest` for empty content, or a Slack API failure.
    pub async fn post(&self, store: &EntityStore, content: Content) -> Result<Value, SlackError> {
        store
            .api()
            .chat_post_message(&content.into_post(&self.id))
            .await
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Channel {}

impl Hash for Channel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Immutable snapshot of a channel's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    data: Value,
}

impl ChannelInfo {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Display name, `#` prefixed.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.data
            .get("name")
            .and_then(Value::as_str)
            .map(|name| format!("#{name}"))
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.data.get("topic")?.get("value")?.as_str()
    }

    /// Archived channels accept no further messages.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.flag("is_archived")
    }

    /// The workspace's default channel.
    #[must_use]
    pub fn is_general(&self) -> bool {
        self.flag("is_general")
    }

    /// Whether the bot is a member.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.flag("is_member")
    }

    /// True for direct-message conversations only; private group channels
    /// report false.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.flag("is_im")
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.data
    }

    fn flag(&self, field: &str) -> bool {
        self.data
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
