//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → POSTGRES_* environment overlay
//!     → command-line overlay
//!     → validation.rs (semantic checks)
//!     → BootstrapConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the process lives only until exec
//! - All fields have defaults matching the stock container entrypoint
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError, Overrides};
pub use schema::BootstrapConfig;
pub use schema::{DatabaseConfig, MigrationConfig, ReadinessConfig, ServerConfig};
pub use schema::{LogFormat, ProbeKind, Secret};
