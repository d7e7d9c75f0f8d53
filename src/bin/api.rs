use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use slack_ingress::api::build_webhook_handler;
use slack_ingress::core::config::AppConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    slack_ingress::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let handler = Arc::new(build_webhook_handler(&config).await?);
    info!(local_mode = config.local_mode, "Slack webhook handler ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move { handler.function_handler(event).await }
    }))
    .await
}
