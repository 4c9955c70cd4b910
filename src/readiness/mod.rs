//! Database readiness subsystem.
//!
//! # Data Flow
//! ```text
//! ReadinessGate::wait (gate.rs):
//!     loop
//!     → probe.rs (pg_isready or TCP connect, bounded by a deadline)
//!     → Ready: log and return
//!     → Unavailable: log, sleep fixed interval, retry
//! ```
//!
//! # Design Decisions
//! - The gate owns the loop, probes own the protocol
//! - Retries forever unless a ceiling is configured
//! - A termination signal interrupts probing or sleeping immediately

pub mod gate;
pub mod probe;

pub use gate::{ReadinessGate, ReadinessReport};
pub use probe::{
    CommandProbe, ConfiguredProbe, ConnectionTarget, ProbeOutcome, ReadinessProbe, TcpProbe,
};
