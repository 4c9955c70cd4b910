//! Readiness probes.
//!
//! # Responsibilities
//! - Answer "is this database accepting connections?" once per call
//! - Keep the password out of argv and logs

use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::Command;

use crate::config::schema::{DatabaseConfig, ProbeKind, ReadinessConfig, Secret};
use crate::config::validation::ValidationError;
use crate::config::ConfigError;

/// Where the readiness probe points.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    pub password: Secret,
}

impl ConnectionTarget {
    /// Build the target from a database section, reporting every unset field.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut take = |value: &Option<String>, name: &'static str| match value {
            Some(v) => v.clone(),
            None => {
                missing.push(ValidationError::MissingEnv(name));
                String::new()
            }
        };

        let host = take(&config.host, "POSTGRES_HOST");
        let user = take(&config.user, "POSTGRES_USER");
        let database = take(&config.name, "POSTGRES_DB");
        if config.password.is_none() {
            missing.push(ValidationError::MissingEnv("POSTGRES_PASSWORD"));
        }

        match (missing.is_empty(), &config.password) {
            (true, Some(password)) => Ok(Self {
                host,
                port: config.port,
                user,
                database,
                password: password.clone(),
            }),
            _ => Err(ConfigError::Validation(missing)),
        }
    }
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    Unavailable(String),
}

/// A single connectivity check against a target.
#[allow(async_fn_in_trait)]
pub trait ReadinessProbe {
    async fn probe(&self, target: &ConnectionTarget) -> ProbeOutcome;
}

/// Probe that runs `pg_isready` (or a compatible utility).
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Arguments passed to the utility. The password travels via `PGPASSWORD`.
    pub fn args(&self, target: &ConnectionTarget) -> Vec<String> {
        vec![
            "-h".to_string(),
            target.host.clone(),
            "-p".to_string(),
            target.port.to_string(),
            "-U".to_string(),
            target.user.clone(),
            "-d".to_string(),
            target.database.clone(),
            "-t".to_string(),
            self.timeout.as_secs().max(1).to_string(),
        ]
    }
}

impl ReadinessProbe for CommandProbe {
    async fn probe(&self, target: &ConnectionTarget) -> ProbeOutcome {
        let status = Command::new(&self.program)
            .args(self.args(target))
            .env("PGPASSWORD", target.password.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => ProbeOutcome::Ready,
            Ok(status) => {
                ProbeOutcome::Unavailable(format!("{} exited with {}", self.program, status))
            }
            Err(e) => ProbeOutcome::Unavailable(format!("failed to run {}: {}", self.program, e)),
        }
    }
}

/// Probe that only checks the port accepts TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl ReadinessProbe for TcpProbe {
    async fn probe(&self, target: &ConnectionTarget) -> ProbeOutcome {
        match TcpStream::connect((target.host.as_str(), target.port)).await {
            Ok(_) => ProbeOutcome::Ready,
            Err(e) => ProbeOutcome::Unavailable(e.to_string()),
        }
    }
}

/// The probe selected by [`ReadinessConfig::probe`].
#[derive(Debug, Clone)]
pub enum ConfiguredProbe {
    Command(CommandProbe),
    Tcp(TcpProbe),
}

impl ConfiguredProbe {
    pub fn from_config(config: &ReadinessConfig) -> Self {
        match config.probe {
            ProbeKind::PgIsready => ConfiguredProbe::Command(CommandProbe::new(
                config.program.clone(),
                Duration::from_secs(config.timeout_secs),
            )),
            ProbeKind::Tcp => ConfiguredProbe::Tcp(TcpProbe),
        }
    }
}

impl ReadinessProbe for ConfiguredProbe {
    async fn probe(&self, target: &ConnectionTarget) -> ProbeOutcome {
        match self {
            ConfiguredProbe::Command(probe) => probe.probe(target).await,
            ConfiguredProbe::Tcp(probe) => probe.probe(target).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn target(host: &str, port: u16) -> ConnectionTarget {
        ConnectionTarget {
            host: host.into(),
            port,
            user: "u".into(),
            database: "d".into(),
            password: Secret::new("p"),
        }
    }

    #[test]
    fn target_requires_every_field() {
        let err = ConnectionTarget::from_config(&DatabaseConfig::default()).unwrap_err();
        match err {
            ConfigError::Validation(missing) => assert_eq!(missing.len(), 4),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn password_stays_out_of_argv() {
        let probe = CommandProbe::new("pg_isready", Duration::from_secs(3));
        let args = probe.args(&target("db", 5432));
        assert_eq!(
            args,
            vec!["-h", "db", "-p", "5432", "-U", "u", "-d", "d", "-t", "3"]
        );
        assert!(!args.iter().any(|a| a == "p"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_probe_reads_exit_status() {
        let ready = CommandProbe::new("true", Duration::from_secs(1));
        assert_eq!(ready.probe(&target("db", 5432)).await, ProbeOutcome::Ready);

        let down = CommandProbe::new("false", Duration::from_secs(1));
        assert!(matches!(down.probe(&target("db", 5432)).await, ProbeOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_utility_is_unavailable_not_fatal() {
        let probe = CommandProbe::new("definitely-not-a-real-pg-isready", Duration::from_secs(1));
        match probe.probe(&target("db", 5432)).await {
            ProbeOutcome::Unavailable(reason) => assert!(reason.contains("failed to run")),
            ProbeOutcome::Ready => panic!("missing utility reported ready"),
        }
    }

    #[tokio::test]
    async fn tcp_probe_detects_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(TcpProbe.probe(&target("127.0.0.1", port)).await, ProbeOutcome::Ready);

        drop(listener);
        assert!(matches!(
            TcpProbe.probe(&target("127.0.0.1", port)).await,
            ProbeOutcome::Unavailable(_)
        ));
    }
}
