//! Process replacement.

use std::io;

use crate::launch::command::ServerCommand;

/// Hands the process over to the server.
pub trait Launcher {
    /// Replace the current process with `command`.
    ///
    /// Only returns if the replacement failed.
    fn exec(&self, command: &ServerCommand) -> io::Error;
}

/// Launcher backed by `execvp(3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecLauncher;

#[cfg(unix)]
impl Launcher for ExecLauncher {
    fn exec(&self, command: &ServerCommand) -> io::Error {
        use std::os::unix::process::CommandExt;

        command.to_command().exec()
    }
}

#[cfg(not(unix))]
impl Launcher for ExecLauncher {
    fn exec(&self, command: &ServerCommand) -> io::Error {
        match command.to_command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(e) => e,
        }
    }
}
