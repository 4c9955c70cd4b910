//! Server invocation.

use std::fmt;

use crate::config::schema::ServerConfig;

/// Program and argv of the application server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    reload: bool,
}

impl ServerCommand {
    /// `program app --host H --port P [--reload] extra_args…`
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut args = vec![
            config.app.clone(),
            "--host".to_string(),
            config.host.clone(),
            "--port".to_string(),
            config.port.to_string(),
        ];
        if config.reload {
            args.push("--reload".to_string());
        }
        args.extend(config.extra_args.iter().cloned());

        Self {
            program: config.program.clone(),
            args,
            reload: config.reload,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn to_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
