//! Collaborator interfaces
//!
//! The pipeline never talks to a cloud SDK directly. It receives these four
//! capabilities at construction; [`crate::aws`] implements them on AWS and
//! [`crate::memory`] implements them in process.

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::models::EmployeeRecord;

/// Readable body of an opened object. Dropping it releases the connection.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret lookup failed for {reference}: {message}")]
    Unavailable { reference: String, message: String },
}

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("Object not found: s3://{location}/{key}")]
    NotFound { location: String, key: String },

    #[error("Access denied: s3://{location}/{key}")]
    AccessDenied { location: String, key: String },

    #[error("Object store unavailable for s3://{location}/{key}: {message}")]
    Unavailable {
        location: String,
        key: String,
        message: String,
    },
}

/// Failure class of a store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The store itself cannot be reached; every further write would fail
    Unreachable,
    /// The store refused this one item
    Rejected,
}

#[derive(Debug, Clone, Error)]
#[error("Write failure ({kind:?}): {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unreachable,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Rejected,
            message: message.into(),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.kind == StoreErrorKind::Unreachable
    }
}

#[derive(Debug, Error)]
#[error("Notification to {target} failed: {message}")]
pub struct NotificationError {
    pub target: String,
    pub message: String,
}

/// Resolves secret material by reference
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, reference: &str) -> Result<String, SecretError>;
}

/// Opens stored objects for reading
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn open_object(&self, location: &str, key: &str) -> Result<ObjectBody, ObjectError>;
}

/// Key-value table holding employee records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or fully overwrite the item stored under `key`.
    ///
    /// Must be atomic per item: after an error the previous item (if any)
    /// is either intact or completely replaced.
    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &EmployeeRecord,
    ) -> Result<(), StoreError>;
}

/// Outbound message channel
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, target: &str, subject: &str, message: &str)
        -> Result<(), NotificationError>;
}
