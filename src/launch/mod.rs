//! Server launch subsystem.
//!
//! # Responsibilities
//! - Build the server invocation from configuration
//! - Replace this process with the server
//!
//! # Design Decisions
//! - exec, not spawn: the server inherits PID 1 and receives signals directly
//! - Off Unix, spawn the server and mirror its exit status
//! - Auto-reload is opt-in and flagged as development-only

pub mod command;
pub mod exec;

pub use command::ServerCommand;
pub use exec::{ExecLauncher, Launcher};
