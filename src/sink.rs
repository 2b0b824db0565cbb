use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use tracing::debug;

use crate::error::SinkError;
use crate::message::OutputRecord;

/// Durable destination for enriched records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &OutputRecord) -> Result<(), SinkError>;
}

/// Writes each record as one item of a DynamoDB table.
pub struct DynamoDbSink {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbSink {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl RecordSink for DynamoDbSink {
    async fn append(&self, record: &OutputRecord) -> Result<(), SinkError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| SinkError::Write {
                id: record.id.clone(),
                table: self.table_name.clone(),
                source: Box::new(e),
            })?;

        debug!(id = %record.id, table = %self.table_name, "record stored");
        Ok(())
    }
}

// Item layout mirrors the record's JSON field names
pub fn record_to_item(record: &OutputRecord) -> HashMap<String, AttributeValue> {
    let properties = record
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect();

    HashMap::from([
        ("id".to_string(), AttributeValue::S(record.id.clone())),
        ("message".to_string(), AttributeValue::S(record.message.clone())),
        ("properties".to_string(), AttributeValue::M(properties)),
        (
            "publicIpAddress".to_string(),
            AttributeValue::S(record.public_ip_address.clone()),
        ),
    ])
}

fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}
