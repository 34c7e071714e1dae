//! Simulated hang test hook
//!
//! [`HangInjector`] wraps a real work unit and consults a [`HangTrigger`] once
//! per cycle. While the trigger is inactive the wrapped unit runs untouched;
//! once active, the cycle blocks forever. The process stays alive but stops
//! heartbeating, which is exactly what a `WatchdogSec=` unit must detect.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::WorkUnit;
use crate::error::WorkError;

/// Predicate deciding whether the current cycle should hang.
pub trait HangTrigger: Debug + Send + Sync {
    fn is_triggered(&self) -> bool;
}

/// Fires while a sentinel file exists.
#[derive(Debug, Clone)]
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HangTrigger for SentinelFile {
    fn is_triggered(&self) -> bool {
        self.path.exists()
    }
}

/// Trigger flipped programmatically; clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualTrigger {
    active: Arc<AtomicBool>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }
}

impl HangTrigger for ManualTrigger {
    fn is_triggered(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Work unit wrapper that hangs when its trigger fires.
#[derive(Debug)]
pub struct HangInjector<W, T> {
    inner: W,
    trigger: T,
}

impl<W, T> HangInjector<W, T> {
    pub fn new(inner: W, trigger: T) -> Self {
        Self { inner, trigger }
    }
}

#[async_trait]
impl<W, T> WorkUnit for HangInjector<W, T>
where
    W: WorkUnit,
    T: HangTrigger,
{
    async fn run_cycle(&mut self, cycle: u64) -> Result<(), WorkError> {
        if self.trigger.is_triggered() {
            tracing::error!(
                cycle,
                trigger = ?self.trigger,
                "Hang trigger active: work unit is now blocked and heartbeats have stopped"
            );
            // No internal timeout; the external watchdog must kill the process
            std::future::pending::<()>().await;
        }

        self.inner.run_cycle(cycle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::IdleWork;
    use std::time::Duration;

    #[test]
    fn test_manual_trigger_shared_between_clones() {
        let trigger = ManualTrigger::new();
        let observer = trigger.clone();
        assert!(!observer.is_triggered());
        trigger.activate();
        assert!(observer.is_triggered());
    }

    #[test]
    fn test_sentinel_file_follows_existence() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = SentinelFile::new(dir.path().join("crash"));
        assert!(!sentinel.is_triggered());

        std::fs::write(sentinel.path(), b"").unwrap();
        assert!(sentinel.is_triggered());

        std::fs::remove_file(sentinel.path()).unwrap();
        assert!(!sentinel.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injector_passes_through_when_inactive() {
        let mut work = HangInjector::new(IdleWork, ManualTrigger::new());
        let result = tokio::time::timeout(Duration::from_secs(1), work.run_cycle(0)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_injector_blocks_when_active() {
        let trigger = ManualTrigger::new();
        trigger.activate();
        let mut work = HangInjector::new(IdleWork, trigger);

        let result = tokio::time::timeout(Duration::from_secs(3600), work.run_cycle(0)).await;
        assert!(result.is_err(), "work unit should never complete");
    }
}
