//! Reply helpers for handlers working from a webhook request or a message.

use serde_json::Value;

use super::channel::Content;
use super::events::{Inbound, message_from_request};
use super::message::Message;
use super::store::EntityStore;
use crate::errors::SlackError;

fn require_message<'a>(request: impl Into<Inbound<'a>>) -> Result<Message, SlackError> {
    message_from_request(request).ok_or_else(|| {
        SlackError::InvalidRequest("request does not contain a chat message".to_string())
    })
}

/// Post `text` to the channel the message came from.
///
/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message, or a Slack API failure.
pub async fn reply<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    text: &str,
) -> Result<Value, SlackError> {
    let message = require_message(request)?;
    message.channel().post(store, Content::text(text)).await
}

/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message, or a Slack API failure.
pub async fn reply_with_blocks<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    blocks: Value,
) -> Result<Value, SlackError> {
    let message = require_message(request)?;
    message.channel().post(store, Content::blocks(blocks)).await
}

/// Reply inside the message's thread, starting one if needed.
///
/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message, or a Slack API failure.
pub async fn threaded_reply<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    text: &str,
) -> Result<Value, SlackError> {
    let message = require_message(request)?;
    let content = Content::text(text).in_thread(message.thread_parent());
    message.channel().post(store, content).await
}

/// Direct-message the author of the message.
///
/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message or has no
/// author, or a Slack API failure.
pub async fn private_reply<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    text: &str,
) -> Result<Value, SlackError> {
    dm_author(store, require_message(request)?, Content::text(text)).await
}

/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message or has no
/// author, or a Slack API failure.
pub async fn private_reply_with_blocks<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    blocks: Value,
) -> Result<Value, SlackError> {
    dm_author(store, require_message(request)?, Content::blocks(blocks)).await
}

async fn dm_author(
    store: &EntityStore,
    message: Message,
    content: Content,
) -> Result<Value, SlackError> {
    let author = message
        .author()
        .ok_or_else(|| SlackError::InvalidRequest("message has no author".to_string()))?;
    author.dm(store, content).await
}

/// # Errors
///
/// Returns `InvalidRequest` if the request is not a message, or a Slack API failure.
pub async fn react<'a>(
    store: &EntityStore,
    request: impl Into<Inbound<'a>>,
    reaction: &str,
) -> Result<(), SlackError> {
    require_message(request)?.react(store, reaction).await
}
