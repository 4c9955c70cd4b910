//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require the connection target when the readiness gate is enabled
//! - Validate value ranges (intervals > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BootstrapConfig → Result<(), Vec<ValidationError>>
//! - Runs before any subprocess is started

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::BootstrapConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required environment variable (or its config-file equivalent) is unset.
    #[error("{0} is required when waiting for the database")]
    MissingEnv(&'static str),

    /// A numeric setting must be positive.
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    /// An executable name is empty.
    #[error("{0} must not be empty")]
    EmptyProgram(&'static str),

    /// The log level is not one of trace, debug, info, warn, error, off.
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.readiness.enabled {
        let db = &config.database;
        if is_blank(db.host.as_deref()) {
            errors.push(ValidationError::MissingEnv("POSTGRES_HOST"));
        }
        if is_blank(db.user.as_deref()) {
            errors.push(ValidationError::MissingEnv("POSTGRES_USER"));
        }
        if is_blank(db.name.as_deref()) {
            errors.push(ValidationError::MissingEnv("POSTGRES_DB"));
        }
        if db.password.is_none() {
            errors.push(ValidationError::MissingEnv("POSTGRES_PASSWORD"));
        }
        if db.port == 0 {
            errors.push(ValidationError::NotPositive("database.port"));
        }
        if config.readiness.interval_secs == 0 {
            errors.push(ValidationError::NotPositive("readiness.interval_secs"));
        }
        if config.readiness.timeout_secs == 0 {
            errors.push(ValidationError::NotPositive("readiness.timeout_secs"));
        }
        if config.readiness.max_attempts == Some(0) {
            errors.push(ValidationError::NotPositive("readiness.max_attempts"));
        }
        if config.readiness.program.trim().is_empty() {
            errors.push(ValidationError::EmptyProgram("readiness.program"));
        }
    }

    if config.migration.enabled && config.migration.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram("migration.program"));
    }

    if config.server.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram("server.program"));
    }
    if config.server.port == 0 {
        errors.push(ValidationError::NotPositive("server.port"));
    }

    if config.observability.log_level.trim().parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
