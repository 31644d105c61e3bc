use anyhow::{Context, Result};
use sqs_dynamodb_bridge::init;

/// Run a single invocation cycle outside Lambda: poll the queue once,
/// store and delete whatever arrived, then flush telemetry and exit.
#[tokio::main]
async fn main() -> Result<()> {
    let (app, telemetry) = init().await?;
    let result = app
        .handle()
        .await
        .with_context(|| format!("Failed to drain queue {:?}", app.settings.sqs_url));
    tokio::task::spawn_blocking(move || telemetry.shutdown())
        .await
        .context("Telemetry shutdown panicked")??;
    result
}
