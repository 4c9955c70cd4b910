//! Configuration loading: file, then environment, then command line.

use std::fs;
use std::path::Path;

use crate::config::schema::{BootstrapConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables naming the connection target.
pub const ENV_HOST: &str = "POSTGRES_HOST";
pub const ENV_PORT: &str = "POSTGRES_PORT";
pub const ENV_USER: &str = "POSTGRES_USER";
pub const ENV_DB: &str = "POSTGRES_DB";
pub const ENV_PASSWORD: &str = "POSTGRES_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidEnv { name: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidEnv { name, value } => {
                write!(f, "Invalid value for {}: {:?}", name, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Command-line settings that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub skip_wait: bool,
    pub skip_migrations: bool,
    pub max_attempts: Option<u32>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub reload: bool,
    pub log_level: Option<String>,
}

/// Parse a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<BootstrapConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay the `POSTGRES_*` variables returned by `lookup`.
pub fn apply_env<F>(config: &mut BootstrapConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let db = &mut config.database;

    if let Some(host) = lookup(ENV_HOST) {
        db.host = Some(host);
    }
    if let Some(raw) = lookup(ENV_PORT) {
        db.port = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_PORT,
            value: raw.clone(),
        })?;
    }
    if let Some(user) = lookup(ENV_USER) {
        db.user = Some(user);
    }
    if let Some(name) = lookup(ENV_DB) {
        db.name = Some(name);
    }
    if let Some(password) = lookup(ENV_PASSWORD) {
        db.password = Some(Secret::new(password));
    }

    Ok(())
}

/// Overlay command-line settings.
pub fn apply_overrides(config: &mut BootstrapConfig, overrides: &Overrides) {
    if overrides.skip_wait {
        config.readiness.enabled = false;
    }
    if overrides.skip_migrations {
        config.migration.enabled = false;
    }
    if let Some(max) = overrides.max_attempts {
        config.readiness.max_attempts = Some(max);
    }
    if let Some(host) = &overrides.host {
        config.server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if overrides.reload {
        config.server.reload = true;
    }
    if let Some(level) = &overrides.log_level {
        config.observability.log_level = level.clone();
    }
}

/// Layer file, environment and command line without validating the result.
pub fn resolve_config<F>(
    path: Option<&Path>,
    lookup: F,
    overrides: &Overrides,
) -> Result<BootstrapConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => BootstrapConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    apply_overrides(&mut config, overrides);

    Ok(config)
}

/// Build and validate the effective configuration.
pub fn load_config<F>(
    path: Option<&Path>,
    lookup: F,
    overrides: &Overrides,
) -> Result<BootstrapConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = resolve_config(path, lookup, overrides)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
