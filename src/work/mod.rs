//! Work units driven by the supervisor
//!
//! A work unit is one iteration's task, opaque to the supervisor. It is
//! awaited to completion before the cycle's heartbeat is sent, so a unit that
//! never returns silences the heartbeat and leaves detection to the external
//! watchdog.

mod hang;

use async_trait::async_trait;

use crate::error::WorkError;

pub use hang::{HangInjector, HangTrigger, ManualTrigger, SentinelFile};

#[async_trait]
pub trait WorkUnit: Send {
    /// Execute cycle number `cycle` (starting at 0).
    async fn run_cycle(&mut self, cycle: u64) -> Result<(), WorkError>;
}

#[async_trait]
impl<W: WorkUnit + ?Sized> WorkUnit for Box<W> {
    async fn run_cycle(&mut self, cycle: u64) -> Result<(), WorkError> {
        (**self).run_cycle(cycle).await
    }
}

/// Placeholder unit that only logs the cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleWork;

#[async_trait]
impl WorkUnit for IdleWork {
    async fn run_cycle(&mut self, cycle: u64) -> Result<(), WorkError> {
        tracing::info!(cycle, "Processing cycle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_work_always_succeeds() {
        let mut work = IdleWork;
        for cycle in 0..3 {
            assert!(work.run_cycle(cycle).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_boxed_work_delegates() {
        let mut work: Box<dyn WorkUnit> = Box::new(IdleWork);
        assert!(work.run_cycle(0).await.is_ok());
    }
}
