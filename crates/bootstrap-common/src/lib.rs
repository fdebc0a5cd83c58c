//! Storage Bootstrap Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the storage bootstrap tools.
//!
//! # Overview
//!
//! This crate provides functionality used by every workspace member:
//!
//! - **Error Handling**: [`BootstrapError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Types**: the storage record model (`Record`, `Acl`, `Legal`)
//!
//! # Example
//!
//! ```no_run
//! use bootstrap_common::types::{Acl, Legal, Record};
//!
//! let acl = Acl::new(vec!["owners@tenant1.example.com".into()], vec!["viewers@tenant1.example.com".into()]);
//! let legal = Legal::new(vec!["tenant1-public-usa".into()], vec!["US".into()]);
//! let record = Record::new("tenant1:wks:master-data--Well:1.0.0", serde_json::json!({}), acl, legal);
//! assert!(record.id.is_none());
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BootstrapError, Result};
