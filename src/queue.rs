//! Defines the queue messages are drained from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use serde::Serialize;

/// The maximum amount of messages fetched by a single poll.
pub const MAX_NUMBER_OF_MESSAGES: i32 = 10;

/// How long a poll waits for messages to arrive, in seconds. Zero
/// makes an empty queue return immediately.
pub const WAIT_TIME_SECONDS: i32 = 0;

/// A message as delivered by the queue. Serializes to the same
/// envelope shape the queue service uses.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

impl Message {
    /// Size in bytes of the JSON-serialized envelope.
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)
            .context("Failed to serialize SQS message")?
            .len())
    }
}

impl From<&aws_sdk_sqs::types::Message> for Message {
    fn from(message: &aws_sdk_sqs::types::Message) -> Self {
        Message {
            message_id: message.message_id().map(String::from),
            receipt_handle: message.receipt_handle().map(String::from),
            body: message.body().map(String::from),
        }
    }
}

/// A source of messages with delete-based acknowledgment.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Poll the queue once, returning whatever is ready (possibly
    /// nothing).
    async fn receive(&self, max_messages: i32, wait_time_seconds: i32) -> Result<Vec<Message>>;

    /// Acknowledge a delivery, removing it from future redelivery.
    async fn delete(&self, receipt_handle: &str) -> Result<()>;
}

/// A queue backed by an SQS queue URL.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        SqsQueue {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl Queue for SqsQueue {
    async fn receive(&self, max_messages: i32, wait_time_seconds: i32) -> Result<Vec<Message>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to receive messages from SQS queue {:?}",
                    self.queue_url
                )
            })?;
        Ok(response
            .messages()
            .unwrap_or_default()
            .iter()
            .map(Message::from)
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to delete message with receipt handle {:?} from SQS queue {:?}",
                    receipt_handle, self.queue_url
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_queue_field_names() {
        let message = Message {
            message_id: Some(String::from("m1")),
            receipt_handle: Some(String::from("r1")),
            body: Some(String::from("{}")),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["MessageId"], "m1");
        assert_eq!(value["ReceiptHandle"], "r1");
        assert_eq!(value["Body"], "{}");
        assert_eq!(
            message.serialized_size().unwrap(),
            serde_json::to_string(&value).unwrap().len()
        );
    }

    #[test]
    fn converts_from_sdk_message() {
        let sdk = aws_sdk_sqs::types::Message::builder()
            .message_id("m1")
            .receipt_handle("r1")
            .body("{\"id\": \"abc\"}")
            .build();
        let message = Message::from(&sdk);
        assert_eq!(message.message_id.as_deref(), Some("m1"));
        assert_eq!(message.receipt_handle.as_deref(), Some("r1"));
        assert_eq!(message.body.as_deref(), Some("{\"id\": \"abc\"}"));
    }
}
