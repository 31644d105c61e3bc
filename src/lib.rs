//! Drains an SQS queue into a DynamoDB table, reporting spans and
//! metrics for every stage to an OTLP backend.

pub mod app;
pub mod client;
pub mod conf;
pub mod metrics;
pub mod queue;
pub mod record;
pub mod store;
pub mod telemetry;

use anyhow::Result;
use app::App;
use metrics::Metrics;
use queue::SqsQueue;
use store::DynamoDbStore;
use telemetry::Telemetry;

/// The application as deployed: SQS in, DynamoDB out.
pub type Bridge = App<SqsQueue, DynamoDbStore>;

/// Perform cold-start initialization: read the settings, set up
/// telemetry and logging, and build the AWS clients.
pub async fn init() -> Result<(Bridge, Telemetry)> {
    let settings = conf::from_env()?;
    let telemetry = Telemetry::new(&settings)?;
    telemetry.init_subscriber()?;

    let config = client::load_config().await;
    let queue = SqsQueue::new(client::sqs(&config), settings.sqs_url.clone());
    let store = DynamoDbStore::new(client::dynamodb(&config), settings.db_table_name.clone());
    let metrics = Metrics::from_meter(&telemetry.meter());
    tracing::info!(?settings, "Cold start completed");

    Ok((App::new(settings, queue, store, metrics), telemetry))
}
