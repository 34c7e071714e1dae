use std::io;

/// Failure of a single work unit.
///
/// Any of these ends the run loop; retrying is up to the work unit itself.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Work unit failed: {0}")]
    Failed(String),

    #[error("Work unit panicked: {0}")]
    Panicked(String),
}

impl WorkError {
    /// Build a `Panicked` error from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        WorkError::Panicked(message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}
