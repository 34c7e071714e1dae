//! Liveness sink abstraction
//!
//! The supervisor reports three things to its environment: readiness, the
//! watchdog interval it commits to, and one heartbeat per completed cycle.
//! Sinks are fire-and-forget: nothing here returns an error, and an
//! unavailable sink behaves exactly like [`NoopNotifier`].
//!
//! Which sink is used is decided once at wiring time by [`from_kind`].

mod recording;
mod systemd;

use std::sync::Arc;
use std::time::Duration;

use crate::config::NotifierKind;

pub use recording::RecordingNotifier;
pub use systemd::SystemdNotifier;

/// Environment variable systemd sets for `Type=notify` units
pub const NOTIFY_SOCKET_ENV: &str = "NOTIFY_SOCKET";

/// A single message sent to a liveness sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMessage {
    /// Initialisation finished
    Ready,
    /// Longest tolerated silence between heartbeats
    WatchdogInterval(Duration),
    /// Proof of progress for one cycle
    Heartbeat,
}

/// Capability interface over the external liveness channel.
pub trait Notifier: Send + Sync {
    fn ready(&self);

    fn watchdog_interval(&self, interval: Duration);

    fn heartbeat(&self);
}

/// Sink that discards everything; the default outside systemd.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn ready(&self) {}

    fn watchdog_interval(&self, _interval: Duration) {}

    fn heartbeat(&self) {}
}

/// Build the sink for the configured kind.
pub fn from_kind(kind: NotifierKind) -> Arc<dyn Notifier> {
    let socket_present = std::env::var_os(NOTIFY_SOCKET_ENV).is_some();
    select(kind, socket_present)
}

fn select(kind: NotifierKind, socket_present: bool) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Systemd => Arc::new(SystemdNotifier::new()),
        NotifierKind::Auto if socket_present => Arc::new(SystemdNotifier::new()),
        NotifierKind::Auto | NotifierKind::None => {
            tracing::debug!("No notification socket in use, liveness messages are discarded");
            Arc::new(NoopNotifier)
        }
    }
}
