//! Graceful shutdown and signal handling.
//!
//! Handles:
//! - SIGTERM: clean stop after the current cycle
//! - SIGINT: same as SIGTERM, for interactive runs
//!
//! SIGKILL is never intercepted and stays the supervisor's last resort.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

/// Monotonic stop flag shared between the signal handler and the run loop.
///
/// Once requested it stays requested. Waiters parked in [`ShutdownFlag::wait`]
/// are woken when the flag flips.
#[derive(Clone)]
pub struct ShutdownFlag {
    inner: Arc<Inner>,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Request shutdown. Returns `true` for the call that flipped the flag.
    pub fn request(&self) -> bool {
        let first = !self.inner.requested.swap(true, Ordering::AcqRel);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking so a request between the check and the await is not lost
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

/// Install SIGTERM and SIGINT handlers that set `flag`.
///
/// Signal streams are registered before this returns, so a signal delivered
/// at any point afterwards is observed. The spawned task only flips the flag.
#[cfg(unix)]
pub fn install_signal_handlers(flag: ShutdownFlag) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = interrupt.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }
        flag.request();
    }))
}

/// Ctrl+C only on non-Unix platforms.
#[cfg(not(unix))]
pub fn install_signal_handlers(flag: ShutdownFlag) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                flag.request();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
    }))
}
