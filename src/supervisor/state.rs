//! Supervisor lifecycle state

use std::fmt;

/// Lifecycle phase of a supervisor.
///
/// ```text
/// Initializing -> ReadyAnnounced -> Running (self-loop) -> Stopping -> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    ReadyAnnounced,
    Running,
    Stopping,
    Stopped,
}

impl Phase {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Initializing, Phase::ReadyAnnounced)
                | (Phase::ReadyAnnounced, Phase::Running)
                | (Phase::Running, Phase::Running)
                | (Phase::Running, Phase::Stopping)
                | (Phase::Stopping, Phase::Stopped)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initializing",
            Phase::ReadyAnnounced => "ready_announced",
            Phase::Running => "running",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Snapshot of a supervisor's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorState {
    pub phase: Phase,
    /// Completed cycles; only ever incremented
    pub cycle_count: u64,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            phase: Phase::Initializing,
            cycle_count: 0,
        }
    }
}

impl SupervisorState {
    /// Move to `next`, ignoring illegal transitions.
    ///
    /// Returns whether the transition happened.
    pub(crate) fn advance(&mut self, next: Phase) -> bool {
        if !self.phase.can_advance_to(next) {
            tracing::warn!(from = %self.phase, to = %next, "Ignoring illegal phase transition");
            return false;
        }
        if self.phase != next {
            tracing::debug!(from = %self.phase, to = %next, "Supervisor phase change");
        }
        self.phase = next;
        true
    }

    pub(crate) fn complete_cycle(&mut self) {
        self.cycle_count += 1;
    }
}
