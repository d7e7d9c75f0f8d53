use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A handler destination resolved for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub destination: String,
}

impl Route {
    #[must_use]
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}

/// A configured routing rule, as read from the `ROUTES` environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub name: String,
    /// Regex matched against the sanitized message body.
    pub pattern: String,
    /// Defaults to the rule name.
    #[serde(default)]
    pub destination: Option<String>,
    /// Only match messages directed at the bot.
    #[serde(default)]
    pub mention_only: bool,
}

/// The job body handed to the queue. The payload is the original webhook
/// body so the worker can re-normalize it independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub correlation_id: String,
    pub route: Route,
    pub payload: Value,
    pub enqueued_at: String,
}
