//! csvdrop common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the csvdrop workspace members:
//!
//! - **Error Handling**: the [`CommonError`] type for setup failures
//! - **Logging**: environment-driven `tracing` subscriber initialization
//!
//! # Example
//!
//! ```no_run
//! use csvdrop_common::logging::{init_logging, LogSettings};
//!
//! fn main() -> csvdrop_common::Result<()> {
//!     let settings = LogSettings::from_env()?;
//!     let _guard = init_logging(&settings)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
