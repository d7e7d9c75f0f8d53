//! Route resolution for normalized messages.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::core::models::{Route, RouteRule};
use crate::errors::SlackError;
use crate::slack::{EntityStore, Message};

pub const DEFAULT_ROUTE: &str = "default";
pub const BLACKHOLE_ROUTE: &str = "blackhole";

#[async_trait]
pub trait Router: Send + Sync {
    /// The first matching route, if any.
    async fn route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Option<Route>, SlackError>;

    /// Fallback used when `route` finds nothing.
    async fn default_route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Route, SlackError>;
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    destination: String,
    pattern: Regex,
    mention_only: bool,
}

/// Ordered regex rules over the sanitized message body.
#[derive(Debug, Default)]
pub struct RuleRouter {
    rules: Vec<CompiledRule>,
}

impl RuleRouter {
    /// # Errors
    ///
    /// Returns `ConfigError` when a rule pattern is not a valid regex.
    pub fn new(rules: &[RouteRule]) -> Result<Self, SlackError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = Regex::new(&rule.pattern).map_err(|e| {
                    SlackError::ConfigError(format!("route '{}': {e}", rule.name))
                })?;
                Ok(CompiledRule {
                    name: rule.name.clone(),
                    destination: rule.destination.clone().unwrap_or_else(|| rule.name.clone()),
                    pattern,
                    mention_only: rule.mention_only,
                })
            })
            .collect::<Result<Vec<_>, SlackError>>()?;

        Ok(Self { rules })
    }
}

#[async_trait]
impl Router for RuleRouter {
    async fn route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Option<Route>, SlackError> {
        if self.rules.is_empty() {
            return Ok(None);
        }

        let body = message.text(store).await?;
        let mut to_bot = None;

        for rule in &self.rules {
            if !rule.pattern.is_match(&body) {
                continue;
            }
            if rule.mention_only {
                let directed = match to_bot {
                    Some(directed) => directed,
                    None => *to_bot.insert(message.to_bot(store).await?),
                };
                if !directed {
                    continue;
                }
            }
            debug!(route = %rule.name, "Matched route rule");
            return Ok(Some(Route::new(&rule.name, &rule.destination)));
        }

        Ok(None)
    }

    async fn default_route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Route, SlackError> {
        let name = if message.to_bot(store).await? {
            DEFAULT_ROUTE
        } else {
            BLACKHOLE_ROUTE
        };
        Ok(Route::new(name, name))
    }
}
