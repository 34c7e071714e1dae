//! Phoenix - systemd watchdog-supervised service
//!
//! Runs a unit of work in a loop while reporting readiness and heartbeats to
//! an external liveness sink, and stops cleanly on SIGTERM.

pub mod config;
pub mod error;
pub mod notify;
pub mod shutdown;
pub mod supervisor;
pub mod work;

pub use error::*;
pub use supervisor::{LivenessSupervisor, Phase, RunOutcome, StopReason, SupervisorState};
