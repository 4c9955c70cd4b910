//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bootstrapper.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Root configuration for the bootstrap pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Database connection target (usually filled from `POSTGRES_*`).
    pub database: DatabaseConfig,

    /// Readiness gate settings.
    pub readiness: ReadinessConfig,

    /// Schema migration settings.
    pub migration: MigrationConfig,

    /// Application server launch settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Database connection target.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database host name.
    pub host: Option<String>,

    /// Database port.
    pub port: u16,

    /// Role used by the readiness probe.
    pub user: Option<String>,

    /// Database name.
    pub name: Option<String>,

    /// Password, handed to the probe as `PGPASSWORD`.
    pub password: Option<Secret>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 5432,
            user: None,
            name: None,
            password: None,
        }
    }
}

/// Which probe the readiness gate uses.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Run the `pg_isready` client utility.
    #[default]
    PgIsready,
    /// Open a TCP connection to the database port.
    Tcp,
}

/// Readiness gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Wait for the database before migrating.
    pub enabled: bool,

    /// Probe implementation.
    pub probe: ProbeKind,

    /// Probe utility for `pg_isready` probes.
    pub program: String,

    /// Fixed sleep between failed probes, in seconds.
    pub interval_secs: u64,

    /// Deadline for a single probe, in seconds.
    pub timeout_secs: u64,

    /// Give up after this many failed probes. Unset retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe: ProbeKind::PgIsready,
            program: "pg_isready".to_string(),
            interval_secs: 1,
            timeout_secs: 3,
            max_attempts: None,
        }
    }
}

/// Migration tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MigrationConfig {
    /// Run migrations before launching.
    pub enabled: bool,

    /// Migration tool executable.
    pub program: String,

    /// Arguments selecting the "upgrade to latest" operation.
    pub args: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "alembic".to_string(),
            args: vec!["upgrade".to_string(), "head".to_string()],
        }
    }
}

/// Application server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server executable.
    pub program: String,

    /// Application import path passed as the first argument.
    pub app: String,

    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Restart on source change. Development only.
    pub reload: bool,

    /// Arguments appended after the bind flags.
    pub extra_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "uvicorn".to_string(),
            app: "app.main:app".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            reload: false,
            extra_args: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// A credential that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    const REDACTED: &'static str = "********";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the value. Only for handing it to a subprocess.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::REDACTED)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}
