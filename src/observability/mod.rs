//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gate, migration and launch stages produce:
//!     → logging.rs (structured log events on stderr)
//!
//! Consumers:
//!     → container log driver
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - stderr only, so the server's stdout stays untouched
//! - Credentials never reach a log line

pub mod logging;
