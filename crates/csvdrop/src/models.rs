//! Data model for one ingestion invocation
//!
//! A batch of [`FileArrival`]s goes in; every data row becomes a
//! [`RowOutcome`]; every file ends as a [`FileOutcome`] inside the
//! [`BatchReport`].

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::error::FileError;
use crate::schema::Field;

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

/// One CSV object to ingest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileArrival {
    /// Bucket (or equivalent container) holding the object
    pub storage_location_id: String,
    pub object_key: String,
}

impl FileArrival {
    pub fn new(storage_location_id: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            storage_location_id: storage_location_id.into(),
            object_key: object_key.into(),
        }
    }
}

impl fmt::Display for FileArrival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.storage_location_id, self.object_key)
    }
}

/// Fields of one CSV line, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

impl From<csv::StringRecord> for RawRow {
    fn from(record: csv::StringRecord) -> Self {
        Self::new(record.iter())
    }
}

/// The canonical mapped entity, keyed by `employee_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub document_name: String,
    pub external_storage_ref: String,
    pub processed_at: DateTime<Utc>,
}

impl EmployeeRecord {
    /// Value of a schema field
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::EmployeeId => &self.employee_id,
            Field::FirstName => &self.first_name,
            Field::MiddleName => &self.middle_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::DocumentName => &self.document_name,
            Field::ExternalStorageRef => &self.external_storage_ref,
        }
    }

    pub(crate) fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::EmployeeId => &mut self.employee_id,
            Field::FirstName => &mut self.first_name,
            Field::MiddleName => &mut self.middle_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::DocumentName => &mut self.document_name,
            Field::ExternalStorageRef => &mut self.external_storage_ref,
        }
    }

    pub(crate) fn empty(processed_at: DateTime<Utc>) -> Self {
        Self {
            employee_id: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            document_name: String::new(),
            external_storage_ref: String::new(),
            processed_at,
        }
    }
}

/// Why a row did not end up in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    InsufficientColumns { expected: usize, found: usize },
    MissingField(Field),
    WriteFailed(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InsufficientColumns { .. } => f.write_str("insufficient columns"),
            RejectionReason::MissingField(field) => write!(f, "missing {}", field.name()),
            RejectionReason::WriteFailed(message) => write!(f, "write failed: {}", message),
        }
    }
}

impl Serialize for RejectionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of mapping one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(EmployeeRecord),
    Rejected {
        row_index: usize,
        reason: RejectionReason,
    },
}

/// A rejected row, by 0-based data row index (header excluded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub row_index: usize,
    pub reason: RejectionReason,
}

/// Per-file tally handed to the notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub file_arrival: FileArrival,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub rejections: Vec<Rejection>,
    /// Set when the remaining rows were abandoned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl FileSummary {
    pub fn new(file_arrival: FileArrival) -> Self {
        Self {
            file_arrival,
            accepted_count: 0,
            rejected_count: 0,
            rejections: Vec::new(),
            aborted: None,
        }
    }

    pub fn record_accepted(&mut self) {
        self.accepted_count += 1;
    }

    pub fn record_rejected(&mut self, row_index: usize, reason: RejectionReason) {
        self.rejected_count += 1;
        self.rejections.push(Rejection { row_index, reason });
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// How one file of the batch ended
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Rows were processed and a notification was attempted
    Completed { summary: FileSummary, notified: bool },
    /// The object could not be opened or decoded; nothing was written
    Skipped {
        file_arrival: FileArrival,
        #[serde(serialize_with = "serialize_display")]
        error: FileError,
    },
    /// The time budget ran out mid-file; no summary was emitted
    Interrupted { file_arrival: FileArrival },
}

impl FileOutcome {
    pub fn file_arrival(&self) -> &FileArrival {
        match self {
            FileOutcome::Completed { summary, .. } => &summary.file_arrival,
            FileOutcome::Skipped { file_arrival, .. } => file_arrival,
            FileOutcome::Interrupted { file_arrival } => file_arrival,
        }
    }

    pub fn summary(&self) -> Option<&FileSummary> {
        match self {
            FileOutcome::Completed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Everything that happened during one invocation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub invocation_id: Uuid,
    pub files: Vec<FileOutcome>,
    /// Files never started because the time budget was exhausted
    pub not_started: Vec<FileArrival>,
}

impl BatchReport {
    pub fn new(invocation_id: Uuid) -> Self {
        Self {
            invocation_id,
            files: Vec::new(),
            not_started: Vec::new(),
        }
    }

    pub fn total_accepted(&self) -> usize {
        self.files
            .iter()
            .filter_map(FileOutcome::summary)
            .map(|s| s.accepted_count)
            .sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.files
            .iter()
            .filter_map(FileOutcome::summary)
            .map(|s| s.rejected_count)
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_arrival_display() {
        let arrival = FileArrival::new("uploads", "hr/2024/employees.csv");
        assert_eq!(arrival.to_string(), "s3://uploads/hr/2024/employees.csv");
    }

    #[test]
    fn test_rejection_reason_display() {
        let short = RejectionReason::InsufficientColumns {
            expected: 7,
            found: 2,
        };
        assert_eq!(short.to_string(), "insufficient columns");
        assert_eq!(
            RejectionReason::MissingField(Field::EmployeeId).to_string(),
            "missing employeeId"
        );
    }

    #[test]
    fn test_summary_keeps_rejection_order() {
        let mut summary = FileSummary::new(FileArrival::new("b", "k.csv"));
        summary.record_accepted();
        summary.record_rejected(3, RejectionReason::MissingField(Field::EmployeeId));
        summary.record_rejected(
            1,
            RejectionReason::InsufficientColumns {
                expected: 7,
                found: 1,
            },
        );

        assert_eq!(summary.accepted_count, 1);
        assert_eq!(summary.rejected_count, 2);
        let indexes: Vec<usize> = summary.rejections.iter().map(|r| r.row_index).collect();
        assert_eq!(indexes, vec![3, 1]);
        assert!(!summary.is_aborted());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut record = EmployeeRecord::empty(Utc::now());
        record.employee_id = "E1".to_string();
        record.external_storage_ref = "s3://b/d1".to_string();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["employeeId"], "E1");
        assert_eq!(json["externalStorageRef"], "s3://b/d1");
        assert!(json.get("processedAt").is_some());
    }
}
