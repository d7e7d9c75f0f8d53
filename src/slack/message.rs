use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::formatting::{mention_pattern, strip_mention, unescape};
use super::store::EntityStore;
use super::user::User;
use crate::errors::SlackError;

/// Inner event kinds that carry chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AppMention,
    Message,
}

impl EventKind {
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "app_mention" => Some(Self::AppMention),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppMention => "app_mention",
            Self::Message => "message",
        }
    }
}

/// The inner `event` object of a message callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub text: String,
    pub ts: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// The edited message carried by `message_changed` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChangedMessage>,
}

/// The nested `message` of a `message_changed` event. Slack leaves the
/// outer event without a `user`, so authorship lives here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

/// A chat message received through the Events API, identified by the
/// callback's `event_id`. The event payload never changes after construction.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    event: MessageEvent,
}

impl Message {
    #[must_use]
    pub fn new(id: impl Into<String>, event: MessageEvent) -> Self {
        Self {
            id: id.into(),
            event,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn event(&self) -> &MessageEvent {
        &self.event
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// The writing user, taken from the nested message for edits. `None` for
    /// messages Slack attributes to no user, such as integration bot posts.
    #[must_use]
    pub fn author(&self) -> Option<User> {
        self.event
            .user
            .as_deref()
            .or_else(|| self.changed().and_then(|m| m.user.as_deref()))
            .map(User::new)
    }

    /// The posting bot's id, when a bot wrote the message.
    #[must_use]
    pub fn bot_id(&self) -> Option<&str> {
        self.event
            .bot_id
            .as_deref()
            .or_else(|| self.changed().and_then(|m| m.bot_id.as_deref()))
    }

    fn changed(&self) -> Option<&ChangedMessage> {
        self.event.message.as_ref()
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        Channel::new(self.event.channel.as_str())
    }

    /// This message's own timestamp. Do not use it for threading replies.
    #[must_use]
    pub fn ts(&self) -> &str {
        &self.event.ts
    }

    #[must_use]
    pub fn thread_ts(&self) -> Option<&str> {
        self.event.thread_ts.as_deref()
    }

    /// The timestamp of this message's thread root; a message outside any
    /// thread is its own root.
    #[must_use]
    pub fn thread_parent(&self) -> &str {
        self.thread_ts().unwrap_or_else(|| self.ts())
    }

    /// True for replies, false for thread roots and unthreaded messages.
    #[must_use]
    pub fn part_of_thread(&self) -> bool {
        self.thread_ts().is_some_and(|parent| parent != self.ts())
    }

    /// Unescaped text with a single mention of the bot removed.
    ///
    /// # Errors
    ///
    /// Fails when the bot's own identity cannot be resolved.
    pub async fn text(&self, store: &EntityStore) -> Result<String, SlackError> {
        let me = store.whoami().await?;
        Ok(strip_mention(&unescape(&self.event.text), me.id()))
    }

    /// Alias of [`Message::text`].
    ///
    /// # Errors
    ///
    /// Fails when the bot's own identity cannot be resolved.
    pub async fn body(&self, store: &EntityStore) -> Result<String, SlackError> {
        self.text(store).await
    }

    /// # Errors
    ///
    /// Fails when the bot's own identity cannot be resolved.
    pub async fn mentions_bot(&self, store: &EntityStore) -> Result<bool, SlackError> {
        let me = store.whoami().await?;
        Ok(mention_pattern(me.id()).is_match(&unescape(&self.event.text)))
    }

    /// Whether the message was sent in a direct-message conversation.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a channel cache miss.
    pub async fn private_message(&self, store: &EntityStore) -> Result<bool, SlackError> {
        self.channel().is_private(store).await
    }

    /// App mentions and direct messages are addressed to the bot.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures on a channel cache miss.
    pub async fn to_bot(&self, store: &EntityStore) -> Result<bool, SlackError> {
        if self.event.kind == EventKind::AppMention {
            return Ok(true);
        }
        self.private_message(store).await
    }

    /// Add a reaction (name without surrounding colons) to this message.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn react(&self, store: &EntityStore, reaction: &str) -> Result<(), SlackError> {
        store
            .api()
            .reactions_add(&self.event.channel, reaction, &self.event.ts)
            .await
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}
