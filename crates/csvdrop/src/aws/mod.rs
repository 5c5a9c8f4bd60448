//! AWS-backed collaborators
//!
//! | port | service |
//! |---|---|
//! | [`ObjectStore`](crate::ports::ObjectStore) | S3 |
//! | [`SecretStore`](crate::ports::SecretStore) | Secrets Manager |
//! | [`RecordStore`](crate::ports::RecordStore) | DynamoDB |
//! | [`NotificationSink`](crate::ports::NotificationSink) | SNS |
//!
//! Clients share one `aws-config` load, so region, credentials and
//! `AWS_ENDPOINT_URL` come from the standard provider chain.

pub mod dynamodb;
pub mod s3;
pub mod secrets;
pub mod sns;

use std::sync::Arc;
use tracing::info;

pub use dynamodb::DynamoRecordStore;
pub use s3::S3ObjectStore;
pub use secrets::SecretsManagerStore;
pub use sns::SnsNotificationSink;

use crate::orchestrator::Collaborators;

/// Build all four collaborators from the default AWS configuration
pub async fn load_collaborators() -> Collaborators {
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    info!(
        region = %sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unset".to_string()),
        "AWS clients initialized"
    );

    Collaborators {
        secrets: Arc::new(SecretsManagerStore::new(aws_sdk_secretsmanager::Client::new(
            &sdk_config,
        ))),
        objects: Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&sdk_config))),
        records: Arc::new(DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(
            &sdk_config,
        ))),
        notifications: Arc::new(SnsNotificationSink::new(aws_sdk_sns::Client::new(&sdk_config))),
    }
}
