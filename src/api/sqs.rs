use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::core::models::{QueuedJob, Route};
use crate::errors::SlackError;

/// At-least-once hand-off of a routed webhook payload to the workers.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, route: &Route, payload: &Value) -> Result<(), SlackError>;
}

#[must_use]
pub fn build_job(route: &Route, payload: &Value) -> QueuedJob {
    QueuedJob {
        correlation_id: Uuid::new_v4().to_string(),
        route: route.clone(),
        payload: payload.clone(),
        enqueued_at: chrono::Utc::now().to_rfc3339(),
    }
}

pub struct SqsQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsQueue {
    #[must_use]
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build the SQS client from the ambient AWS configuration.
    pub async fn from_env(queue_url: impl Into<String>) -> Self {
        let shared_config = aws_config::from_env().load().await;
        Self::new(SqsClient::new(&shared_config), queue_url)
    }
}

#[async_trait]
impl JobQueue for SqsQueue {
    /// # Errors
    ///
    /// Returns an error if serialization fails or the message cannot be sent to SQS.
    async fn enqueue(&self, route: &Route, payload: &Value) -> Result<(), SlackError> {
        let job = build_job(route, payload);
        let message_body = serde_json::to_string(&job)
            .map_err(|e| SlackError::ParseError(format!("Failed to serialize job: {e}")))?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| SlackError::AwsError(format!("Failed to send message to SQS: {e}")))?;

        info!(
            correlation_id = %job.correlation_id,
            route = %route.name,
            "Enqueued webhook payload"
        );
        Ok(())
    }
}
