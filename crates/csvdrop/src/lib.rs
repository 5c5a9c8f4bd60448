//! csvdrop
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads employee CSV files dropped into object storage into a key-value
//! table, one notification per file.
//!
//! # Pipeline
//!
//! - **Event**: S3 event documents become [`FileArrival`]s
//! - **Parser**: object bytes become raw rows
//! - **Mapper**: raw rows are validated against the canonical schema
//! - **Writer**: accepted records are upserted by `employeeId`
//! - **Notifier**: one summary message per processed file
//!
//! The [`Orchestrator`] drives all of it against four injected
//! collaborators (see [`ports`]). [`memory`] holds in-process versions for
//! tests and local runs; the `aws` feature adds the cloud adapters.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use csvdrop::memory::{
//!     MemoryNotificationSink, MemoryObjectStore, MemoryRecordStore, MemorySecretStore,
//! };
//! use csvdrop::{Collaborators, FileArrival, IngestSettings, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let objects = Arc::new(MemoryObjectStore::new());
//!     objects.put("uploads", "staff.csv", "employeeId,firstName\nE1,Ann,,Lee,a@x.com,d,s3://b/d\n");
//!
//!     let collaborators = Collaborators {
//!         secrets: Arc::new(MemorySecretStore::new().with_secret("csv/recipient", "ops@x.com")),
//!         objects,
//!         records: Arc::new(MemoryRecordStore::new()),
//!         notifications: Arc::new(MemoryNotificationSink::new()),
//!     };
//!
//!     let orchestrator = Orchestrator::new(collaborators, IngestSettings::from_env()?);
//!     let report = orchestrator.run(&[FileArrival::new("uploads", "staff.csv")]).await?;
//!     println!("accepted {}", report.total_accepted());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod mapper;
pub mod memory;
pub mod models;
pub mod notifier;
pub mod orchestrator;
pub mod parser;
pub mod ports;
pub mod schema;
pub mod writer;

#[cfg(feature = "aws")]
pub mod aws;

pub use config::{ConfigResolver, IngestSettings, ResolvedConfig};
pub use error::{ConfigError, FileError, IngestError, Result};
pub use event::parse_event;
pub use models::{BatchReport, EmployeeRecord, FileArrival, FileOutcome, FileSummary, RowOutcome};
pub use orchestrator::{Collaborators, Orchestrator};
pub use schema::{Field, CANONICAL_SCHEMA, SCHEMA_VERSION};
