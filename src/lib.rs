//! Container bootstrapper: wait for PostgreSQL, apply migrations, exec the server.

pub mod config;
pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod migration;
pub mod observability;
pub mod readiness;

pub use config::schema::BootstrapConfig;
pub use error::{BootstrapError, BootstrapResult};
pub use lifecycle::{Bootstrap, Shutdown, Stage};
