//! Defines the application: one invocation drains a batch from the
//! queue into the store, reporting spans and metrics along the way.

use crate::conf::Settings;
use crate::metrics::{Dependency, Metrics};
use crate::queue::{Message, Queue, MAX_NUMBER_OF_MESSAGES, WAIT_TIME_SECONDS};
use crate::record;
use crate::store::Store;
use anyhow::{anyhow, Context, Result};
use tracing::{field, info, info_span, instrument, Instrument, Span};

/// The JSON response returned to the runtime on success.
const RESPONSE_BODY: &str = "null";

/// An App is the initialized handler state: the settings, the queue
/// and store clients, and the metric instruments. It is built once at
/// cold start and reused by every invocation.
pub struct App<Q, S> {
    /// The settings read at cold start.
    pub settings: Settings,

    /// Where messages come from.
    pub queue: Q,

    /// Where records go.
    pub store: S,

    /// The process-wide instruments.
    pub metrics: Metrics,
}

impl<Q: Queue, S: Store> App<Q, S> {
    pub fn new(settings: Settings, queue: Q, store: S, metrics: Metrics) -> Self {
        App {
            settings,
            queue,
            store,
            metrics,
        }
    }

    /// Handle one invocation. Any failure is counted and returned
    /// unchanged; the invocation latency is recorded either way.
    pub async fn handle(&self) -> Result<()> {
        self.metrics.record_incoming();
        let _timer = self.metrics.time_dependency(Dependency::Lambda);

        info!("Lambda handler started");
        match self.handle_event().await {
            Ok(()) => {
                self.metrics.record_response_size(RESPONSE_BODY.len());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    #[instrument(
        name = "Handle Lambda Event",
        skip(self),
        fields(aws.lambda.function_name = %self.settings.aws_lambda_function_name),
        err
    )]
    async fn handle_event(&self) -> Result<()> {
        let messages = self.receive().await?;
        if messages.is_empty() {
            info!("No messages to process");
            self.metrics.record_empty_batch();
        } else {
            self.metrics.record_batch_received(messages.len());
            for message in &messages {
                self.process(message).await?;
                self.metrics.record_request_size(message.serialized_size()?);
            }
            // Only credited once the whole batch went through; a failure
            // above leaves earlier, already deleted messages uncounted.
            self.metrics.record_batch_processed(messages.len());
        }
        info!("Lambda handler finished");
        Ok(())
    }

    /// Poll the queue once without waiting.
    #[instrument(
        name = "Receive Messages from SQS",
        skip(self),
        fields(sqs.queue_url = %self.settings.sqs_url, sqs.message_count = field::Empty),
        err
    )]
    pub async fn receive(&self) -> Result<Vec<Message>> {
        let _timer = self.metrics.time_dependency(Dependency::Sqs);
        let messages = self
            .queue
            .receive(MAX_NUMBER_OF_MESSAGES, WAIT_TIME_SECONDS)
            .await?;
        Span::current().record("sqs.message_count", messages.len());
        info!("Received {} messages from SQS", messages.len());
        Ok(messages)
    }

    /// Store a single message's payload, then delete the message. The
    /// recorded latency covers the whole message, delete included.
    #[instrument(
        name = "Process Message",
        skip(self, message),
        fields(
            dynamodb.table_name = %self.settings.db_table_name,
            messaging.message_id = message.message_id.as_deref().unwrap_or_default(),
        ),
        err
    )]
    pub async fn process(&self, message: &Message) -> Result<()> {
        let _timer = self.metrics.time_dependency(Dependency::DynamoDb);

        let body = message
            .body
            .as_deref()
            .ok_or_else(|| anyhow!("Message has no body"))?;
        let record = record::parse(body)?;

        async {
            info!("Putting item to DynamoDB");
            self.store.put(&record).await
        }
        .instrument(info_span!("Put Item to DynamoDB"))
        .await?;

        async {
            info!("Deleting message from SQS");
            let receipt_handle = message
                .receipt_handle
                .as_deref()
                .context("Message has no receipt handle")?;
            self.queue.delete(receipt_handle).await
        }
        .instrument(info_span!("Delete Message from SQS"))
        .await
    }
}
