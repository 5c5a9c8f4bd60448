use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

use crate::models::EmployeeRecord;
use crate::ports::{RecordStore, StoreError};
use crate::schema::CANONICAL_SCHEMA;

/// Attribute holding the processing timestamp (RFC 3339, UTC)
pub const PROCESSED_AT_ATTRIBUTE: &str = "processedAt";

#[derive(Clone)]
pub struct DynamoRecordStore {
    client: Client,
}

impl DynamoRecordStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Item attributes for a record; the key attribute always carries `key`
pub fn to_item(key: &str, record: &EmployeeRecord) -> HashMap<String, AttributeValue> {
    let mut item: HashMap<String, AttributeValue> = CANONICAL_SCHEMA
        .columns
        .iter()
        .map(|column| {
            (
                column.field.name().to_string(),
                AttributeValue::S(record.field(column.field).to_string()),
            )
        })
        .collect();

    item.insert(
        CANONICAL_SCHEMA.key.name().to_string(),
        AttributeValue::S(key.to_string()),
    );
    item.insert(
        PROCESSED_AT_ATTRIBUTE.to_string(),
        AttributeValue::S(record.processed_at.to_rfc3339()),
    );
    item
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &EmployeeRecord,
    ) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(key, record)))
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }
}

/// Connectivity problems and a missing table will fail every later write
/// the same way; anything else is specific to the item.
fn classify(err: SdkError<PutItemError>) -> StoreError {
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            return StoreError::unreachable(message)
        },
        _ => {},
    }

    match err.as_service_error() {
        Some(PutItemError::ResourceNotFoundException(_)) => StoreError::unreachable(message),
        _ => StoreError::rejected(message),
    }
}
