//! systemd sd_notify sink

use std::time::Duration;

use sd_notify::NotifyState;

use super::Notifier;

/// Reports over the `NOTIFY_SOCKET` datagram socket.
///
/// `sd_notify` is a no-op when the socket variable is absent, and send errors
/// are only logged, so this sink never fails the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemdNotifier;

impl SystemdNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Watchdog timeout systemd configured for this unit, if any.
    ///
    /// Reads `WATCHDOG_USEC`/`WATCHDOG_PID` without clearing them.
    pub fn unit_watchdog() -> Option<Duration> {
        let mut usec = 0u64;
        if sd_notify::watchdog_enabled(false, &mut usec) {
            Some(Duration::from_micros(usec))
        } else {
            None
        }
    }

    fn send(&self, state: NotifyState<'_>, what: &'static str) {
        // Environment is kept so later messages still find the socket
        if let Err(e) = sd_notify::notify(false, &[state]) {
            tracing::debug!(error = %e, message = what, "Failed to notify systemd");
        }
    }
}

/// WATCHDOG_USEC value, saturating at the protocol field width
fn watchdog_usec(interval: Duration) -> u32 {
    u32::try_from(interval.as_micros()).unwrap_or(u32::MAX)
}

impl Notifier for SystemdNotifier {
    fn ready(&self) {
        self.send(NotifyState::Ready, "READY");
    }

    fn watchdog_interval(&self, interval: Duration) {
        self.send(
            NotifyState::WatchdogUsec(watchdog_usec(interval)),
            "WATCHDOG_USEC",
        );
    }

    fn heartbeat(&self) {
        self.send(NotifyState::Watchdog, "WATCHDOG");
    }
}
