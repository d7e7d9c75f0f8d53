//! Cache-backed attribute lookups for Slack entities.
//!
//! Entities only hold an id and, at most, a snapshot handed to them at
//! construction. Everything else is resolved here, through the shared
//! `EntityCache`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::client::SlackApi;
use super::user::User;
use crate::core::cache::EntityCache;
use crate::errors::SlackError;

/// Channel metadata and membership are cached for five minutes.
pub const CHANNEL_TTL: Duration = Duration::from_secs(300);

pub const WHOAMI_KEY: &str = "whoami";

#[derive(Clone)]
pub struct EntityStore {
    api: Arc<dyn SlackApi>,
    cache: Arc<EntityCache>,
}

impl EntityStore {
    #[must_use]
    pub fn new(api: Arc<dyn SlackApi>, cache: Arc<EntityCache>) -> Self {
        Self { api, cache }
    }

    #[must_use]
    pub fn api(&self) -> &dyn SlackApi {
        self.api.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// The bot's own user, resolved once through `auth.test` and kept for
    /// the life of the process.
    ///
    /// # Errors
    ///
    /// Fails when `auth.test` fails or returns no `user_id`.
    pub async fn whoami(&self) -> Result<User, SlackError> {
        self.identity()
            .await?
            .get("user_id")
            .and_then(Value::as_str)
            .map(User::new)
            .ok_or_else(|| SlackError::ApiError("auth.test response missing user_id".to_string()))
    }

    /// The bot id behind the token, if `auth.test` reported one. Shares the
    /// `whoami` cache entry.
    ///
    /// # Errors
    ///
    /// Fails when `auth.test` fails.
    pub async fn own_bot_id(&self) -> Result<Option<String>, SlackError> {
        Ok(self
            .identity()
            .await?
            .get("bot_id")
            .and_then(Value::as_str)
            .map(ToString::to_string))
    }

    async fn identity(&self) -> Result<Value, SlackError> {
        self.cache
            .get_or_compute(WHOAMI_KEY, None, || async {
                debug!("Resolving own identity");
                self.api.auth_test().await
            })
            .await
    }

    /// Raw `users.info` bundle for `user_id`. Profiles never expire.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn user_data(&self, user_id: &str) -> Result<Value, SlackError> {
        self.cache
            .get_or_compute(&format!("users.{user_id}"), None, || async {
                let response = self.api.users_info(user_id).await?;
                take_field(response, "user", "users.info")
            })
            .await
    }

    /// Raw `conversations.info` bundle for `channel_id`.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn channel_data(&self, channel_id: &str) -> Result<Value, SlackError> {
        self.cache
            .get_or_compute(&format!("channels.{channel_id}"), Some(CHANNEL_TTL), || async {
                let response = self.api.conversations_info(channel_id).await?;
                take_field(response, "channel", "conversations.info")
            })
            .await
    }

    /// Member ids of `channel_id`, ascending and without duplicates.
    ///
    /// # Errors
    ///
    /// Propagates Slack API failures.
    pub async fn channel_member_ids(&self, channel_id: &str) -> Result<Vec<String>, SlackError> {
        let ids = self
            .cache
            .get_or_compute(
                &format!("channels.{channel_id}.member_ids"),
                Some(CHANNEL_TTL),
                || async {
                    let mut ids = self.api.conversations_members(channel_id).await?;
                    ids.sort();
                    ids.dedup();
                    Ok::<_, SlackError>(Value::from(ids))
                },
            )
            .await?;

        Ok(ids
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn take_field(mut response: Value, field: &str, method: &str) -> Result<Value, SlackError> {
    match response.get_mut(field).map(Value::take) {
        Some(value) if value.is_object() => Ok(value),
        _ => Err(SlackError::ApiError(format!(
            "{method} response missing {field}"
        ))),
    }
}
