//! Webhook endpoint and request processing

pub mod dispatcher;
pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod router;
pub mod signature;
pub mod sqs;

use std::sync::Arc;

use crate::core::cache::EntityCache;
use crate::core::config::AppConfig;
use crate::errors::SlackError;
use crate::slack::{EntityStore, SlackClient};

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handler::WebhookHandler;
pub use router::{Router, RuleRouter};
pub use signature::SignatureVerifier;
pub use sqs::{JobQueue, SqsQueue};

/// Build the webhook handler with the production collaborators.
///
/// # Errors
///
/// Returns `ConfigError` when the configured routes do not compile.
pub async fn build_webhook_handler(config: &AppConfig) -> Result<WebhookHandler, SlackError> {
    let slack = Arc::new(SlackClient::with_base_url(
        config.slack_bot_token.clone(),
        &config.slack_api_base_url,
    ));
    let store = EntityStore::new(slack, Arc::new(EntityCache::new()));
    let router = Arc::new(RuleRouter::new(&config.routes)?);
    let queue = Arc::new(SqsQueue::from_env(config.processing_queue_url.clone()).await);

    Ok(WebhookHandler::new(
        config,
        Dispatcher::new(store, router, queue),
    ))
}
