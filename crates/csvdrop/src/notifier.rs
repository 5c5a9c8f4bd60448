//! Per-file notification
//!
//! Exactly one message per processed file. Delivery is best effort: a failed
//! send is reported to the caller but written records stay written.

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use crate::models::FileSummary;
use crate::ports::{NotificationError, NotificationSink};

pub const SUBJECT: &str = "CSV Upload";

#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    target: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, target: impl Into<String>) -> Self {
        Self {
            sink,
            target: target.into(),
        }
    }

    pub async fn notify(&self, summary: &FileSummary) -> Result<(), NotificationError> {
        let message = render_message(summary);
        self.sink.send(&self.target, SUBJECT, &message).await?;

        info!(
            target_id = %self.target,
            file = %summary.file_arrival,
            "Notification sent"
        );
        Ok(())
    }
}

/// Message body for a file summary
pub fn render_message(summary: &FileSummary) -> String {
    let mut message = format!("CSV uploaded: {}\n", summary.file_arrival);
    let _ = writeln!(message, "Accepted: {}", summary.accepted_count);
    let _ = writeln!(message, "Rejected: {}", summary.rejected_count);

    for rejection in &summary.rejections {
        let _ = writeln!(message, "  row {}: {}", rejection.row_index, rejection.reason);
    }

    if let Some(ref reason) = summary.aborted {
        let _ = writeln!(message, "Aborted: {}", reason);
    }

    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryNotificationSink;
    use crate::models::{FileArrival, RejectionReason};

    fn summary() -> FileSummary {
        let mut summary = FileSummary::new(FileArrival::new("uploads", "staff.csv"));
        summary.record_accepted();
        summary.record_rejected(
            2,
            RejectionReason::InsufficientColumns {
                expected: 7,
                found: 2,
            },
        );
        summary
    }

    #[test]
    fn test_message_lists_counts_and_rejections() {
        let message = render_message(&summary());
        assert!(message.starts_with("CSV uploaded: s3://uploads/staff.csv\n"));
        assert!(message.contains("Accepted: 1\n"));
        assert!(message.contains("Rejected: 1\n"));
        assert!(message.contains("  row 2: insufficient columns\n"));
        assert!(!message.contains("Aborted"));
    }

    #[test]
    fn test_message_mentions_abort() {
        let mut summary = summary();
        summary.abort("record store unreachable");
        assert!(render_message(&summary).contains("Aborted: record store unreachable"));
    }

    #[tokio::test]
    async fn test_notify_sends_one_message() {
        let sink = Arc::new(MemoryNotificationSink::new());
        let notifier = Notifier::new(sink.clone(), "arn:aws:sns:eu-west-1:123:csv");

        notifier.notify(&summary()).await.unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target, "arn:aws:sns:eu-west-1:123:csv");
        assert_eq!(sent[0].subject, SUBJECT);
        assert!(sent[0].message.contains("s3://uploads/staff.csv"));
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let sink = Arc::new(MemoryNotificationSink::new());
        sink.set_failing(true);
        let notifier = Notifier::new(sink.clone(), "topic");

        let err = notifier.notify(&summary()).await.unwrap_err();
        assert_eq!(err.target, "topic");
        assert!(sink.sent().is_empty());
    }
}
