//! Liveness supervisor run loop
//!
//! Announces readiness and the watchdog interval, then repeats
//! work unit, heartbeat, sleep until shutdown is requested or a work unit
//! fails. Heartbeats are only sent after a work unit completes, so a stuck
//! unit is visible to the external watchdog as silence.
//!
//! The sleep between cycles races the shutdown flag, so a termination signal
//! received while idle ends the loop without waiting out the period.

mod state;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::Timings;
use crate::error::{SupervisorError, WorkError};
use crate::notify::Notifier;
use crate::shutdown::{install_signal_handlers, ShutdownFlag};
use crate::work::WorkUnit;

pub use state::{Phase, SupervisorState};

/// Why the run loop ended
#[derive(Debug)]
pub enum StopReason {
    /// Termination signal or an explicit request through the shutdown flag
    ShutdownRequested,
    /// The work unit returned an error or panicked
    WorkFailed(WorkError),
}

/// Result of a finished run
#[derive(Debug)]
pub struct RunOutcome {
    pub state: SupervisorState,
    pub reason: StopReason,
}

impl RunOutcome {
    pub fn cycles(&self) -> u64 {
        self.state.cycle_count
    }

    pub fn is_clean(&self) -> bool {
        matches!(self.reason, StopReason::ShutdownRequested)
    }
}

/// Drives a work unit while proving liveness to a [`Notifier`].
pub struct LivenessSupervisor<W> {
    timings: Timings,
    work: W,
    notifier: Arc<dyn Notifier>,
    shutdown: ShutdownFlag,
    signals: Option<JoinHandle<()>>,
    state: SupervisorState,
}

impl<W: WorkUnit> LivenessSupervisor<W> {
    pub fn new(timings: Timings, work: W, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            timings,
            work,
            notifier,
            shutdown: ShutdownFlag::new(),
            signals: None,
            state: SupervisorState::default(),
        }
    }

    /// Intercept SIGTERM/SIGINT before the loop starts.
    ///
    /// Must be called from within a tokio runtime. [`run`](Self::run)
    /// installs the handlers itself when this was not called.
    pub fn with_signal_handlers(mut self) -> Result<Self, SupervisorError> {
        self.ensure_signal_handlers()?;
        Ok(self)
    }

    fn ensure_signal_handlers(&mut self) -> Result<(), SupervisorError> {
        if self.signals.is_none() {
            let handle =
                install_signal_handlers(self.shutdown.clone()).map_err(SupervisorError::Signal)?;
            tracing::info!("Termination signal handler installed");
            self.signals = Some(handle);
        }
        Ok(())
    }

    /// Handle for requesting a stop from outside the loop
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Run until shutdown is requested or the work unit fails.
    ///
    /// Consumes the supervisor; a run happens at most once. Fails only if the
    /// signal handlers cannot be installed, before anything is notified.
    #[instrument(
        name = "supervisor.run",
        skip(self),
        fields(
            work_period = ?self.timings.work_period(),
            watchdog_interval = ?self.timings.watchdog_interval()
        )
    )]
    pub async fn run(mut self) -> Result<RunOutcome, SupervisorError> {
        self.ensure_signal_handlers()?;

        self.notifier.ready();
        self.state.advance(Phase::ReadyAnnounced);

        self.notifier.watchdog_interval(self.timings.watchdog_interval());
        self.state.advance(Phase::Running);
        tracing::info!("Service ready, entering run loop");

        let mut failure = None;

        while !self.shutdown.is_requested() {
            let cycle = self.state.cycle_count;

            let result = AssertUnwindSafe(self.work.run_cycle(cycle))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(WorkError::from_panic(payload)));

            if let Err(e) = result {
                tracing::error!(cycle, error = %e, "Unexpected work unit failure, stopping");
                failure = Some(e);
                self.shutdown.request();
                break;
            }

            self.notifier.heartbeat();
            self.state.complete_cycle();
            self.state.advance(Phase::Running);
            tracing::trace!(cycle, "Heartbeat sent");

            tokio::select! {
                _ = tokio::time::sleep(self.timings.work_period()) => {}
                _ = self.shutdown.wait() => {}
            }
        }

        self.state.advance(Phase::Stopping);
        if let Some(handle) = self.signals.take() {
            handle.abort();
        }
        self.state.advance(Phase::Stopped);

        let reason = match failure {
            Some(e) => StopReason::WorkFailed(e),
            None => StopReason::ShutdownRequested,
        };

        tracing::info!(
            cycles = self.state.cycle_count,
            clean = matches!(reason, StopReason::ShutdownRequested),
            "Service finished its run loop"
        );

        Ok(RunOutcome {
            state: self.state,
            reason,
        })
    }
}
