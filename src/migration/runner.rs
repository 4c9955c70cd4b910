//! Migration tool invocation.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::config::schema::MigrationConfig;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::lifecycle::signals::TerminationSignal;

/// Applies pending schema migrations.
#[allow(async_fn_in_trait)]
pub trait Migrator {
    async fn migrate(&self, shutdown: &mut ShutdownListener) -> BootstrapResult<()>;
}

/// Runs an external migration tool such as `alembic upgrade head`.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    program: String,
    args: Vec<String>,
}

impl MigrationRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn spawn(&self) -> BootstrapResult<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| BootstrapError::MigrationSpawn {
                program: self.program.clone(),
                source,
            })
    }

    fn check_status(&self, status: ExitStatus) -> BootstrapResult<()> {
        if status.success() {
            return Ok(());
        }

        if let Some(code) = status.code() {
            return Err(BootstrapError::MigrationFailed {
                program: self.program.clone(),
                code,
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Err(BootstrapError::MigrationKilled {
                    program: self.program.clone(),
                    signal,
                });
            }
        }

        Err(BootstrapError::MigrationFailed {
            program: self.program.clone(),
            code: 1,
        })
    }
}

impl Migrator for MigrationRunner {
    async fn migrate(&self, shutdown: &mut ShutdownListener) -> BootstrapResult<()> {
        tracing::info!(program = %self.program, args = ?self.args, "Applying migrations");

        let mut child = self.spawn()?;
        let mut interrupted = None;

        let status = loop {
            tokio::select! {
                status = child.wait() => {
                    break status.map_err(|source| BootstrapError::MigrationSpawn {
                        program: self.program.clone(),
                        source,
                    })?;
                }
                signal = shutdown.signalled(), if interrupted.is_none() => {
                    tracing::warn!(
                        signal = %signal,
                        program = %self.program,
                        "Forwarding signal to migration tool"
                    );
                    forward_signal(&mut child, signal);
                    interrupted = Some(signal);
                }
            }
        };

        if let Some(signal) = interrupted {
            return Err(BootstrapError::Interrupted(signal));
        }

        self.check_status(status)?;
        tracing::info!(program = %self.program, "Migrations applied");
        Ok(())
    }
}

#[cfg(unix)]
fn forward_signal(child: &mut Child, signal: TerminationSignal) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; pid is our own child.
    if unsafe { libc::kill(pid, signal.signo()) } == -1 {
        tracing::warn!(
            error = %std::io::Error::last_os_error(),
            "Failed to forward signal to migration tool"
        );
    }
}

#[cfg(not(unix))]
fn forward_signal(child: &mut Child, _signal: TerminationSignal) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "Failed to stop migration tool");
    }
}
