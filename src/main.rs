use anyhow::{anyhow, Result};
use lambda_runtime::{run, service_fn, LambdaEvent};
use serde_json::Value;
use sqs_dynamodb_bridge::{init, telemetry::Telemetry, Bridge};
use tracing::warn;

/// Drain one batch from the queue. The triggering event only starts
/// the invocation; its contents are ignored.
async fn function_handler(
    app: &Bridge,
    telemetry: &Telemetry,
    _event: LambdaEvent<Value>,
) -> Result<()> {
    let result = app.handle().await;
    // Export before the execution environment is frozen.
    let telemetry = telemetry.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || telemetry.flush()).await {
        warn!("Telemetry flush did not complete: {:?}", e);
    }
    result
}

/// Run an AWS Lambda function that, on every invocation, polls an SQS
/// queue, writes each message's payload to a DynamoDB table and
/// deletes the message.
#[tokio::main]
async fn main() -> Result<()> {
    let (app, telemetry) = init().await?;
    let app = &app;
    let telemetry = &telemetry;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(app, telemetry, event).await
    }))
    .await
    .map_err(|e| anyhow!("{:?}", e))
}
