/// Slack Events API ingestion for a chat bot.
///
/// Inbound webhooks are authenticated, normalized into `Message`s, checked
/// against the bot's own identity and handed to a job queue along with the
/// route that should handle them.
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda behind API Gateway for the webhook endpoint
/// - SQS as the job queue between the endpoint and the handlers
/// - slack-morphism and reqwest for Slack Web API calls
/// - A process-wide TTL cache for user, channel and identity lookups
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use slack_ingress::core::cache::EntityCache;
/// use slack_ingress::slack::{EntityStore, SlackClient, message_from_request};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     slack_ingress::setup_logging();
///
///     let store = EntityStore::new(
///         Arc::new(SlackClient::new("xoxb-token".to_string())),
///         Arc::new(EntityCache::new()),
///     );
///
///     let payload = serde_json::json!({
///         "type": "event_callback",
///         "event_id": "Ev1",
///         "event": {"type": "app_mention", "text": "<@U1> help", "ts": "1.0", "channel": "C1", "user": "U2"}
///     });
///     if let Some(message) = message_from_request(&payload) {
///         println!("{}", message.text(&store).await?);
///     }
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod slack;

pub use errors::{SlackError, VerifyError};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Safe to call more
/// than once; later calls leave the first subscriber in place.
///
/// # Example
///
/// ```
/// slack_ingress::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
