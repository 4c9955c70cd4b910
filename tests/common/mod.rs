//! Shared utilities for driving the compiled bootstrapper.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Environment of a well-configured container.
pub const POSTGRES_ENV: &[(&str, &str)] = &[
    ("POSTGRES_HOST", "db"),
    ("POSTGRES_USER", "u"),
    ("POSTGRES_DB", "d"),
    ("POSTGRES_PASSWORD", "s3cret-pw"),
];

/// Write an executable shell script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Write a bootstrap config pointing every stage at scripts in `dir`.
pub fn write_config(dir: &Path, probe: &Path, migrate: &Path, server: &Path) -> PathBuf {
    let path = dir.join("bootstrap.toml");
    let config = format!(
        "[readiness]\nprogram = {:?}\n\n[migration]\nprogram = {:?}\n\n[server]\nprogram = {:?}\n",
        probe.display().to_string(),
        migrate.display().to_string(),
        server.display().to_string(),
    );
    fs::write(&path, config).unwrap();
    path
}

/// A bootstrapper command with a scrubbed environment.
pub fn bootstrap(config: &Path, env: &[(&str, &str)]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pg-bootstrap"));
    command
        .env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_default())
        .env("RUST_LOG", "pg_bootstrap=info")
        .arg("--config")
        .arg(config);
    for (key, value) in env {
        command.env(key, value);
    }
    command
}

/// Spawn a bootstrapper with its output discarded.
pub fn spawn_quiet(mut command: Command) -> Child {
    command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

/// Read the event journal the fake tools append to.
pub fn events(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("events"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Poll the event journal until a line starting with `prefix` shows up.
pub fn wait_for_event(dir: &Path, prefix: &str) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if events(dir).iter().any(|e| e.starts_with(prefix)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("no {:?} event within 10s: {:?}", prefix, events(dir));
}

/// Deliver SIGTERM to a spawned bootstrapper.
pub fn terminate(child: &Child) {
    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGTERM) }, 0);
}
