//! Schema migration subsystem.
//!
//! # Responsibilities
//! - Run the migration tool's "upgrade to latest" exactly once
//! - Surface its exit status unchanged
//!
//! # Design Decisions
//! - Never retried: a half-applied migration must not be re-run blindly
//! - Tool output goes straight to the container log (inherited stdio)
//! - A termination signal is forwarded to the tool, not swallowed

pub mod runner;

pub use runner::{Migrator, MigrationRunner};
