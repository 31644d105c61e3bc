//! Defines the key-value store records are written to.

use crate::record::{self, Record};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

/// A durable store with blind-overwrite upserts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Write a record, replacing whatever was stored under the same
    /// key.
    async fn put(&self, record: &Record) -> Result<()>;
}

/// A store backed by a DynamoDB table.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        DynamoDbStore {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn put(&self, record: &Record) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record::to_item(record)))
            .send()
            .await
            .with_context(|| format!("Failed to put item into table {:?}", self.table_name))?;
        Ok(())
    }
}
