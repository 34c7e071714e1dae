use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{Notifier, NotifyMessage};

/// In-memory sink that keeps every message in send order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<NotifyMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NotifyMessage>> {
        // A panicking holder cannot leave the Vec half-written
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, message: NotifyMessage) {
        self.lock().push(message);
    }

    /// Snapshot of all messages so far
    pub fn messages(&self) -> Vec<NotifyMessage> {
        self.lock().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.count(|m| matches!(m, NotifyMessage::Heartbeat))
    }

    pub fn count(&self, pred: impl Fn(&NotifyMessage) -> bool) -> usize {
        self.lock().iter().filter(|m| pred(*m)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn ready(&self) {
        self.push(NotifyMessage::Ready);
    }

    fn watchdog_interval(&self, interval: Duration) {
        self.push(NotifyMessage::WatchdogInterval(interval));
    }

    fn heartbeat(&self) {
        self.push(NotifyMessage::Heartbeat);
    }
}
