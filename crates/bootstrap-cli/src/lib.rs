//! Storage bootstrap CLI library
//!
//! Bulk-loads a directory of JSON manifests into a record storage service,
//! and deletes them again.
//!
//! # Overview
//!
//! - **Loading**: rewrite manifest ids to the target partition, attach ACL
//!   and legal metadata, batch, and create/update concurrently
//!   (`storage-bootstrap load`)
//! - **Deletion**: delete every manifest record by id
//!   (`storage-bootstrap delete`)
//!
//! Both paths share one worker pool: workers claim units from a
//! lock-guarded cursor, submit them under a bounded retry policy, and collect
//! terminal failures into a single end-of-run report.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod transform;

// Re-export commonly used types
pub use config::BootstrapConfig;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// Storage bootstrap - bulk load and delete manifest records
#[derive(Parser, Debug)]
#[command(name = "storage-bootstrap")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update every manifest record
    Load {
        /// Ask the service to skip records identical to the stored version
        #[arg(long)]
        skip_dupes: bool,
    },

    /// Delete every manifest record
    Delete,
}
