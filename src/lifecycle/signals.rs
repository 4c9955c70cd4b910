//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM and SIGINT (Ctrl-C off Unix)
//! - Translate them into [`Shutdown`] triggers
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed explicitly because PID 1 ignores signals
//!   that have no handler
//! - exec resets the handlers, so the server installs its own

use std::fmt;
use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Signals that abort the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGTERM, sent by container runtimes on stop.
    Terminate,
    /// SIGINT, sent on Ctrl-C.
    Interrupt,
}

impl TerminationSignal {
    /// The platform signal number.
    #[cfg(unix)]
    pub fn signo(self) -> i32 {
        match self {
            TerminationSignal::Terminate => libc::SIGTERM,
            TerminationSignal::Interrupt => libc::SIGINT,
        }
    }

    /// The POSIX signal number.
    #[cfg(not(unix))]
    pub fn signo(self) -> i32 {
        match self {
            TerminationSignal::Terminate => 15,
            TerminationSignal::Interrupt => 2,
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Install signal handlers and forward the first signal to `shutdown`.
///
/// Handlers are registered before this returns, so no signal is lost
/// between the call and the first await.
#[cfg(unix)]
pub fn listen(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = terminate.recv() => TerminationSignal::Terminate,
                _ = interrupt.recv() => TerminationSignal::Interrupt,
            };
            tracing::warn!(signal = %received, "Termination signal received");
            shutdown.trigger(received);
        }
    }))
}

/// Install a Ctrl-C handler and forward it to `shutdown`.
#[cfg(not(unix))]
pub fn listen(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(signal = %TerminationSignal::Interrupt, "Termination signal received");
            shutdown.trigger(TerminationSignal::Interrupt);
        }
    }))
}
