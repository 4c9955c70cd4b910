//! Bootstrap error taxonomy and its mapping onto process exit codes.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::signals::TerminationSignal;

/// `EX_CONFIG` from sysexits.h.
const EXIT_CONFIG: u8 = 78;
/// `EX_UNAVAILABLE` from sysexits.h.
const EXIT_UNAVAILABLE: u8 = 69;
const EXIT_NOT_EXECUTABLE: u8 = 126;
const EXIT_NOT_FOUND: u8 = 127;

/// Errors that abort the bootstrap sequence.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The optional probe ceiling was reached.
    #[error("database still unavailable after {attempts} attempts")]
    ReadinessExhausted { attempts: u32 },

    /// A termination signal arrived before the server was launched.
    #[error("received {0}, aborting bootstrap")]
    Interrupted(TerminationSignal),

    /// The migration tool could not be started.
    #[error("failed to start migration tool `{program}`: {source}")]
    MigrationSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The migration tool exited with a non-zero status.
    #[error("migration tool `{program}` exited with status {code}")]
    MigrationFailed { program: String, code: i32 },

    /// The migration tool was killed by a signal.
    #[error("migration tool `{program}` was killed by signal {signal}")]
    MigrationKilled { program: String, signal: i32 },

    /// Process replacement into the server failed.
    #[error("failed to launch server `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

impl BootstrapError {
    /// Process exit status for this failure. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Config(_) => EXIT_CONFIG,
            BootstrapError::ReadinessExhausted { .. } => EXIT_UNAVAILABLE,
            BootstrapError::Interrupted(signal) => signal_exit_code(signal.signo()),
            BootstrapError::MigrationSpawn { source, .. } => spawn_exit_code(source),
            BootstrapError::MigrationFailed { code, .. } => nonzero(*code),
            BootstrapError::MigrationKilled { signal, .. } => signal_exit_code(*signal),
            BootstrapError::Launch { source, .. } => spawn_exit_code(source),
        }
    }
}

/// Shell convention for a process ended by a signal.
fn signal_exit_code(signo: i32) -> u8 {
    nonzero(128 + signo)
}

fn spawn_exit_code(err: &io::Error) -> u8 {
    match err.kind() {
        io::ErrorKind::NotFound => EXIT_NOT_FOUND,
        io::ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
        _ => 1,
    }
}

fn nonzero(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}
