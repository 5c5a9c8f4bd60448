//! Pipeline error types
//!
//! Errors are scoped by the unit they fail:
//!
//! - [`ConfigError`]: the whole invocation, before any file is touched
//! - [`FileError`]: one file, the batch continues
//! - [`WriteError`]: one row, the file usually continues
//!
//! Row validation failures are not errors; they are
//! [`RowOutcome::Rejected`](crate::models::RowOutcome) values.

use thiserror::Error;

use crate::ports::{ObjectError, SecretError, StoreError};

/// Result type alias for invocation-level operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid column delimiter {0:?}: expected a single ASCII character")]
    InvalidDelimiter(String),

    #[error("Invalid time budget {0:?}: expected whole seconds")]
    InvalidTimeBudget(String),

    #[error("Secret lookup failed: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum FileParseError {
    #[error("File is not valid UTF-8 text (first invalid byte at offset {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },

    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Object access failed: {0}")]
    Access(#[from] ObjectError),

    #[error("File parse failed: {0}")]
    Parse(#[from] FileParseError),
}

#[derive(Error, Debug)]
#[error("Write of employee {employee_id} (row {row_index}) failed: {source}")]
pub struct WriteError {
    pub employee_id: String,
    pub row_index: usize,
    #[source]
    pub source: StoreError,
}

impl WriteError {
    pub fn is_store_unreachable(&self) -> bool {
        self.source.is_unreachable()
    }
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid event document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Object key is not valid percent-encoded UTF-8: {0}")]
    InvalidKey(String),
}

/// Errors that abort a whole invocation
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
