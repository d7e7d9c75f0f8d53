use std::env;

use crate::core::models::RouteRule;
use crate::errors::SlackError;

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub processing_queue_url: String,
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub slack_api_base_url: String,
    /// Disables request signature verification. Local development only.
    pub local_mode: bool,
    pub routes: Vec<RouteRule>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or `ROUTES`
    /// is not a valid JSON array of route rules.
    pub fn from_env() -> Result<Self, SlackError> {
        let local_mode = env::var("LOCAL_MODE").is_ok_and(|v| parse_flag(&v));

        let slack_signing_secret = match env::var("SLACK_SIGNING_SECRET") {
            Ok(secret) => secret,
            Err(_) if local_mode => String::new(),
            Err(e) => return Err(SlackError::ConfigError(format!("SLACK_SIGNING_SECRET: {e}"))),
        };

        let routes = match env::var("ROUTES") {
            Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|e| SlackError::ConfigError(format!("ROUTES: {e}")))?,
            _ => Vec::new(),
        };

        Ok(Self {
            processing_queue_url: env::var("PROCESSING_QUEUE_URL")
                .map_err(|e| SlackError::ConfigError(format!("PROCESSING_QUEUE_URL: {e}")))?,
            slack_signing_secret,
            slack_bot_token: env::var("SLACK_BOT_TOKEN")
                .map_err(|e| SlackError::ConfigError(format!("SLACK_BOT_TOKEN: {e}")))?,
            slack_api_base_url: env::var("SLACK_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SLACK_API_BASE_URL.to_string()),
            local_mode,
            routes,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
