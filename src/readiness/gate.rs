//! The readiness gate: poll the database until it accepts connections.

use std::time::Duration;

use tokio::time;

use crate::config::schema::ReadinessConfig;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::readiness::probe::{ConnectionTarget, ProbeOutcome, ReadinessProbe};

/// Summary of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Probes performed, including the successful one.
    pub attempts: u32,
    /// Probes that failed before the database became available.
    pub failed_attempts: u32,
}

/// Blocks the pipeline until a probe succeeds.
pub struct ReadinessGate<P> {
    probe: P,
    target: ConnectionTarget,
    interval: Duration,
    timeout: Duration,
    max_attempts: Option<u32>,
}

impl<P: ReadinessProbe> ReadinessGate<P> {
    pub fn new(probe: P, target: ConnectionTarget, config: &ReadinessConfig) -> Self {
        Self {
            probe,
            target,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Probe until the database is available.
    ///
    /// Never gives up unless a ceiling is configured. Returns
    /// [`BootstrapError::Interrupted`] as soon as a termination signal arrives.
    pub async fn wait(&self, shutdown: &mut ShutdownListener) -> BootstrapResult<ReadinessReport> {
        tracing::info!(
            host = %self.target.host,
            port = self.target.port,
            user = %self.target.user,
            database = %self.target.database,
            "Waiting for database"
        );

        let mut failed_attempts: u32 = 0;

        loop {
            let outcome = tokio::select! {
                outcome = self.probe_once() => outcome,
                signal = shutdown.signalled() => return Err(BootstrapError::Interrupted(signal)),
            };

            let reason = match outcome {
                ProbeOutcome::Ready => {
                    tracing::info!(
                        host = %self.target.host,
                        failed_attempts,
                        "database is available"
                    );
                    return Ok(ReadinessReport {
                        attempts: failed_attempts + 1,
                        failed_attempts,
                    });
                }
                ProbeOutcome::Unavailable(reason) => reason,
            };

            failed_attempts += 1;

            if let Some(max) = self.max_attempts {
                if failed_attempts >= max {
                    tracing::warn!(
                        host = %self.target.host,
                        attempt = failed_attempts,
                        reason = %reason,
                        "database is unavailable - giving up"
                    );
                    return Err(BootstrapError::ReadinessExhausted {
                        attempts: failed_attempts,
                    });
                }
            }

            tracing::info!(
                host = %self.target.host,
                attempt = failed_attempts,
                reason = %reason,
                "database is unavailable - sleeping"
            );

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                signal = shutdown.signalled() => return Err(BootstrapError::Interrupted(signal)),
            }
        }
    }

    async fn probe_once(&self) -> ProbeOutcome {
        match time::timeout(self.timeout, self.probe.probe(&self.target)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Unavailable(format!(
                "probe timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::config::schema::Secret;
    use crate::lifecycle::shutdown::Shutdown;
    use crate::lifecycle::signals::TerminationSignal;

    /// Fails a fixed number of times, then reports ready.
    struct FlakyProbe {
        failures: u32,
        calls: Cell<u32>,
    }

    impl FlakyProbe {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Cell::new(0),
            }
        }
    }

    impl ReadinessProbe for FlakyProbe {
        async fn probe(&self, _target: &ConnectionTarget) -> ProbeOutcome {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call < self.failures {
                ProbeOutcome::Unavailable("connection refused".into())
            } else {
                ProbeOutcome::Ready
            }
        }
    }

    struct HangingProbe;

    impl ReadinessProbe for HangingProbe {
        async fn probe(&self, _target: &ConnectionTarget) -> ProbeOutcome {
            std::future::pending().await
        }
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn target() -> ConnectionTarget {
        ConnectionTarget {
            host: "db".into(),
            port: 5432,
            user: "u".into(),
            database: "d".into(),
            password: Secret::new("p"),
        }
    }

    fn gate<P: ReadinessProbe>(probe: P, max_attempts: Option<u32>) -> ReadinessGate<P> {
        let config = ReadinessConfig {
            max_attempts,
            ..ReadinessConfig::default()
        };
        ReadinessGate::new(probe, target(), &config)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_first_success() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let gate = gate(FlakyProbe::new(3), None);

        let start = Instant::now();
        let report = gate.wait(&mut listener).await.unwrap();

        assert_eq!(report, ReadinessReport { attempts: 4, failed_attempts: 3 });
        assert_eq!(gate.probe.calls.get(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_database_does_not_sleep() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let gate = gate(FlakyProbe::new(0), None);

        let start = Instant::now();
        let report = gate.wait(&mut listener).await.unwrap();

        assert_eq!(report.failed_attempts, 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn logs_each_failure_then_availability() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        gate(FlakyProbe::new(2), None).wait(&mut listener).await.unwrap();

        let logs = capture.contents();
        assert_eq!(logs.matches("database is unavailable - sleeping").count(), 2);
        assert_eq!(logs.matches("database is available").count(), 1);
        assert!(!logs.contains("PGPASSWORD"));
    }

    #[tokio::test(start_paused = true)]
    async fn optional_ceiling_stops_retrying() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let gate = gate(FlakyProbe::new(10), Some(3));

        let err = gate.wait(&mut listener).await.unwrap_err();

        assert!(matches!(err, BootstrapError::ReadinessExhausted { attempts: 3 }));
        assert_eq!(gate.probe.calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_times_out() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let gate = gate(HangingProbe, Some(2));

        let start = Instant::now();
        let err = gate.wait(&mut listener).await.unwrap_err();

        assert!(matches!(err, BootstrapError::ReadinessExhausted { attempts: 2 }));
        // two 3s deadlines plus one 1s sleep between them
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn termination_interrupts_the_loop() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let gate = gate(FlakyProbe::new(u32::MAX), None);

        shutdown.trigger(TerminationSignal::Terminate);
        let err = gate.wait(&mut listener).await.unwrap_err();

        assert!(matches!(err, BootstrapError::Interrupted(TerminationSignal::Terminate)));
    }
}
