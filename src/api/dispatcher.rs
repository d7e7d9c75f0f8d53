//! Decides whether a webhook payload is acted on and forwards it to a route.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::router::Router;
use super::sqs::JobQueue;
use crate::core::models::Route;
use crate::errors::SlackError;
use crate::slack::{EntityStore, message_from_request};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The payload did not normalize to a message.
    Unhandled,
    /// The bot wrote the message itself.
    OwnMessage,
    /// No user could be attributed, so self-authorship cannot be ruled out.
    Unattributed,
    Enqueued(Route),
}

pub struct Dispatcher {
    store: EntityStore,
    router: Arc<dyn Router>,
    queue: Arc<dyn JobQueue>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: EntityStore, router: Arc<dyn Router>, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            store,
            router,
            queue,
        }
    }

    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Normalize `payload`, drop the bot's own and unattributed messages,
    /// resolve a route and enqueue the original payload for it.
    ///
    /// # Errors
    ///
    /// Slack lookups and enqueue failures propagate unchanged.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn run(&self, payload: &Value) -> Result<DispatchOutcome, SlackError> {
        let request_type = payload.get("type").and_then(Value::as_str).unwrap_or("");
        debug!(request_type, "Received request");

        let Some(message) = message_from_request(payload) else {
            info!("Unable to handle request");
            return Ok(DispatchOutcome::Unhandled);
        };

        let me = self.store.whoami().await?;

        if let Some(bot_id) = message.bot_id() {
            if self.store.own_bot_id().await?.as_deref() == Some(bot_id) {
                debug!(event_id = %message.id(), "Ignoring my own bot message");
                return Ok(DispatchOutcome::OwnMessage);
            }
        }

        let Some(author) = message.author() else {
            info!(
                event_id = %message.id(),
                subtype = message.event().subtype.as_deref().unwrap_or(""),
                "Ignoring message without an author"
            );
            return Ok(DispatchOutcome::Unattributed);
        };

        if author == me {
            debug!(event_id = %message.id(), "Ignoring my own message");
            return Ok(DispatchOutcome::OwnMessage);
        }

        let profile = author.profile(&self.store).await?;
        if profile.is_bot() {
            info!(
                bot_handle = profile.handle().unwrap_or(author.id()),
                "Responding to message from bot"
            );
        }

        let route = match self.router.route(&message, &self.store).await? {
            Some(route) => route,
            None => self.router.default_route(&message, &self.store).await?,
        };

        info!(
            event_id = %message.id(),
            channel = %message.channel().id(),
            route = %route.name,
            "Dispatching message"
        );

        self.queue.enqueue(&route, payload).await?;
        Ok(DispatchOutcome::Enqueued(route))
    }
}
