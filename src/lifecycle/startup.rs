//! Startup orchestration.
//!
//! # Responsibilities
//! - Wait for the database (optional stage)
//! - Apply schema migrations
//! - Replace this process with the application server
//!
//! # Design Decisions
//! - One pipeline; running without the readiness gate just omits the stage
//! - Fail fast: the first error ends the sequence
//! - Launch is last and never returns on success

use crate::config::schema::BootstrapConfig;
use crate::config::ConfigError;
use crate::error::{BootstrapError, BootstrapResult};
use crate::launch::{ExecLauncher, Launcher, ServerCommand};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::migration::{MigrationRunner, Migrator};
use crate::readiness::{ConfiguredProbe, ConnectionTarget, ReadinessGate, ReadinessProbe};

/// Where [`Bootstrap::prepare`] stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// After the readiness gate.
    Ready,
    /// After migrations.
    Migrated,
}

/// The bootstrap pipeline: `[gate] → migrate → launch`.
pub struct Bootstrap<P, M, L> {
    gate: Option<ReadinessGate<P>>,
    migrator: Option<M>,
    launcher: L,
    server: ServerCommand,
}

impl Bootstrap<ConfiguredProbe, MigrationRunner, ExecLauncher> {
    /// Assemble the production pipeline from a validated configuration.
    pub fn from_config(config: &BootstrapConfig) -> Result<Self, ConfigError> {
        let gate = if config.readiness.enabled {
            let target = ConnectionTarget::from_config(&config.database)?;
            let probe = ConfiguredProbe::from_config(&config.readiness);
            Some(ReadinessGate::new(probe, target, &config.readiness))
        } else {
            None
        };

        let migrator = config
            .migration
            .enabled
            .then(|| MigrationRunner::from_config(&config.migration));

        Ok(Self::new(
            gate,
            migrator,
            ExecLauncher,
            ServerCommand::from_config(&config.server),
        ))
    }
}

impl<P, M, L> Bootstrap<P, M, L>
where
    P: ReadinessProbe,
    M: Migrator,
    L: Launcher,
{
    pub fn new(
        gate: Option<ReadinessGate<P>>,
        migrator: Option<M>,
        launcher: L,
        server: ServerCommand,
    ) -> Self {
        Self {
            gate,
            migrator,
            launcher,
            server,
        }
    }

    /// Run every stage up to and including `last`, without launching.
    pub async fn prepare(
        &self,
        last: Stage,
        shutdown: &mut ShutdownListener,
    ) -> BootstrapResult<()> {
        match &self.gate {
            Some(gate) => {
                gate.wait(shutdown).await?;
            }
            None => tracing::info!("Readiness gate disabled, not waiting for database"),
        }

        if last < Stage::Migrated {
            return Ok(());
        }

        match &self.migrator {
            Some(migrator) => migrator.migrate(shutdown).await?,
            None => tracing::info!("Migrations disabled, skipping"),
        }

        Ok(())
    }

    /// Exec the server. Only returns on failure.
    pub fn launch(&self, shutdown: &mut ShutdownListener) -> BootstrapError {
        if let Some(signal) = shutdown.pending() {
            return BootstrapError::Interrupted(signal);
        }

        if self.server.reload() {
            tracing::warn!("Server auto-reload is enabled; this is for development only");
        }
        tracing::info!(command = %self.server, "Launching server");

        let source = self.launcher.exec(&self.server);
        BootstrapError::Launch {
            program: self.server.program().to_string(),
            source,
        }
    }

    /// Full sequence. Yields an error only; success means this process became the server.
    pub async fn run(&self, shutdown: &mut ShutdownListener) -> BootstrapError {
        if let Err(e) = self.prepare(Stage::Migrated, shutdown).await {
            return e;
        }
        // let the signal task publish anything the OS delivered during the last stage
        tokio::task::yield_now().await;
        self.launch(shutdown)
    }
}
