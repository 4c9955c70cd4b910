//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     [Readiness gate] → Migrations → exec server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → every stage observes it → abort before launch
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown (forwarded to a running migration)
//! ```
//!
//! # Design Decisions
//! - Strictly ordered stages, no stage starts before the previous succeeded
//! - Fail fast: any stage error is fatal
//! - The server replaces this process, so nothing runs after launch

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::TerminationSignal;
pub use startup::{Bootstrap, Stage};
