use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;
use tracing::debug;

use crate::ports::{NotificationError, NotificationSink};

#[derive(Clone)]
pub struct SnsNotificationSink {
    client: Client,
}

impl SnsNotificationSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationSink for SnsNotificationSink {
    async fn send(
        &self,
        target: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), NotificationError> {
        let output = self
            .client
            .publish()
            .topic_arn(target)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| NotificationError {
                target: target.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(message_id = output.message_id().unwrap_or_default(), "Published to SNS");
        Ok(())
    }
}
