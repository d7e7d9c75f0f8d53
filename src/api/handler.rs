//! Webhook endpoint: verification, handshake and dispatch.

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::{helpers, parsing, signature::SignatureVerifier};
use crate::core::config::AppConfig;
use crate::slack::events;

pub struct WebhookHandler {
    /// `None` in local mode, where requests are trusted unverified.
    verifier: Option<SignatureVerifier>,
    dispatcher: Dispatcher,
}

impl WebhookHandler {
    #[must_use]
    pub fn new(config: &AppConfig, dispatcher: Dispatcher) -> Self {
        let verifier = if config.local_mode {
            warn!("LOCAL_MODE is set: Slack request verification is DISABLED");
            None
        } else {
            Some(SignatureVerifier::new(config.slack_signing_secret.clone()))
        };

        Self {
            verifier,
            dispatcher,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Lambda entry point.
    ///
    /// # Errors
    ///
    /// Never fails; every outcome is encoded in the returned response.
    #[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
    pub async fn function_handler(&self, event: LambdaEvent<Value>) -> Result<Value, Error> {
        Ok(self.handle(&event.payload).await)
    }

    /// Turn an API Gateway proxy event into a proxy response.
    pub async fn handle(&self, event: &Value) -> Value {
        match parsing::request_method(event).as_str() {
            "OPTIONS" => return helpers::empty_response(200),
            "POST" => {}
            other => {
                warn!(method = %other, "Unsupported HTTP method");
                return helpers::err_response(405, "Method not allowed");
            }
        }

        let body = match parsing::request_body(event) {
            Ok(body) => body,
            Err(e) => {
                warn!("Encountered {}", e);
                return helpers::unprocessable(&e.to_string());
            }
        };

        if let Some(verifier) = &self.verifier {
            let headers = event.get("headers").unwrap_or(&Value::Null);
            let timestamp = parsing::get_header_value(headers, "X-Slack-Request-Timestamp");
            let signature = parsing::get_header_value(headers, "X-Slack-Signature");

            if let Err(e) = verifier.verify(&body, timestamp, signature) {
                error!(reason = %e, "Slack request verification failed");
                return helpers::unauthorized();
            }
        } else {
            warn!("Skipping Slack request verification (LOCAL_MODE)");
        }

        let payload: Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Encountered {}", e);
                return helpers::unprocessable(&e.to_string());
            }
        };

        if let Some(challenge) = events::challenge(&payload) {
            info!("Answering URL verification challenge");
            return helpers::ok_challenge(&challenge);
        }

        match self.dispatcher.run(&payload).await {
            Ok(outcome) => {
                if let DispatchOutcome::Enqueued(route) = &outcome {
                    info!(route = %route.name, "Webhook payload enqueued");
                }
                helpers::ok_status()
            }
            Err(e) => {
                warn!(collaborator_failure = e.is_collaborator_failure(), "Encountered {}", e);
                helpers::unprocessable(&e.to_string())
            }
        }
    }
}
