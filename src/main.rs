//! pg-bootstrap: container entrypoint for database-backed web services.
//!
//! # Architecture Overview
//!
//! ```text
//!   container start
//!        │
//!        ▼
//!   ┌──────────┐   ┌────────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │  config  │──▶│ readiness gate │──▶│  migrations  │──▶│ exec server  │
//!   │ file/env │   │  (optional)    │   │ upgrade head │   │ 0.0.0.0:8000 │
//!   └──────────┘   └───────┬────────┘   └──────┬───────┘   └──────────────┘
//!                          │ retry, fixed      │ non-zero:
//!                          │ backoff           │ exit with tool status
//!                          ▼                   ▼
//!                    SIGTERM/SIGINT ──────▶ exit 128+signo
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};

use pg_bootstrap::config::schema::ObservabilityConfig;
use pg_bootstrap::config::validation::validate_config;
use pg_bootstrap::config::{
    load_config, resolve_config, BootstrapConfig, ConfigError, Overrides,
};
use pg_bootstrap::lifecycle::signals;
use pg_bootstrap::observability::logging;
use pg_bootstrap::{Bootstrap, BootstrapError, Shutdown, Stage};

#[derive(Parser)]
#[command(name = "pg-bootstrap", version)]
#[command(
    about = "Wait for PostgreSQL, apply migrations, then exec the application server",
    long_about = None
)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "BOOTSTRAP_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the readiness gate.
    #[arg(long, env = "BOOTSTRAP_SKIP_WAIT", value_parser = BoolishValueParser::new())]
    no_wait: bool,

    /// Skip schema migrations.
    #[arg(long, env = "BOOTSTRAP_SKIP_MIGRATIONS", value_parser = BoolishValueParser::new())]
    skip_migrations: bool,

    /// Give up after this many failed probes (default: never).
    #[arg(long, env = "BOOTSTRAP_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Server bind address.
    #[arg(long, env = "BOOTSTRAP_HOST")]
    host: Option<String>,

    /// Server bind port.
    #[arg(long, env = "BOOTSTRAP_PORT")]
    port: Option<u16>,

    /// Pass --reload to the server (development only).
    #[arg(long, env = "BOOTSTRAP_RELOAD", value_parser = BoolishValueParser::new())]
    reload: bool,

    /// Log level when RUST_LOG is unset.
    #[arg(long, env = "BOOTSTRAP_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Wait for the database, migrate, then exec the server (default)
    Run,
    /// Only wait for the database
    Wait,
    /// Wait for the database and migrate, without launching
    Migrate,
    /// Print the resolved configuration
    Config,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            skip_wait: self.no_wait,
            skip_migrations: self.skip_migrations,
            max_attempts: self.max_attempts,
            host: self.host.clone(),
            port: self.port,
            reload: self.reload,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = cli.overrides();
    let env = |key: &str| std::env::var(key).ok();

    if let Some(Commands::Config) = cli.command {
        return print_config(resolve_config(cli.config.as_deref(), env, &overrides));
    }

    let config = match load_config(cli.config.as_deref(), env, &overrides) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            return fail(BootstrapError::from(e));
        }
    };
    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pg-bootstrap starting");

    let shutdown = Shutdown::new();
    let mut listener = shutdown.subscribe();
    if let Err(e) = signals::listen(shutdown.clone()) {
        tracing::warn!(error = %e, "Failed to install signal handlers");
    }

    let bootstrap = match Bootstrap::from_config(&config) {
        Ok(bootstrap) => bootstrap,
        Err(e) => return fail(BootstrapError::from(e)),
    };

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Wait => bootstrap.prepare(Stage::Ready, &mut listener).await,
        Commands::Migrate => bootstrap.prepare(Stage::Migrated, &mut listener).await,
        Commands::Run | Commands::Config => Err(bootstrap.run(&mut listener).await),
    };

    match result {
        Ok(()) => {
            tracing::info!("Bootstrap finished without launching the server");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn init_logging(config: &ObservabilityConfig) {
    if let Err(e) = logging::init(config) {
        eprintln!("pg-bootstrap: failed to initialize logging: {}", e);
    }
}

fn fail(err: BootstrapError) -> ExitCode {
    tracing::error!(error = %err, exit_code = err.exit_code(), "Bootstrap failed");
    ExitCode::from(err.exit_code())
}

fn print_config(resolved: Result<BootstrapConfig, ConfigError>) -> ExitCode {
    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pg-bootstrap: {}", e);
            return ExitCode::from(BootstrapError::from(e).exit_code());
        }
    };

    match toml::to_string_pretty(&config) {
        Ok(rendered) => print!("{}", rendered),
        Err(e) => {
            eprintln!("pg-bootstrap: failed to render configuration: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if let Err(errors) = validate_config(&config) {
        for error in errors {
            eprintln!("warning: {}", error);
        }
    }

    ExitCode::SUCCESS
}
