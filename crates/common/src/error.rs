use std::time::Duration;

use thiserror::Error;

/// The error taxonomy shared by every component (§7 of the design doc).
///
/// Only `Fatal` may abort a process. Everything else is either retried,
/// surfaced to a caller, or recovered and counted.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("permanent input failure: {0}")]
    PermanentInput(String),

    #[error("already applied")]
    AlreadyApplied,

    #[error("precondition failed")]
    PreconditionFailed,

    #[error("circuit open, retry after {retry_after:?}")]
    CircuitOpen { retry_after: Duration },

    #[error("fatal: {0}")]
    Fatal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CoreError {
    /// Whether the caller should treat this as worth retrying in place
    /// (as opposed to dead-lettering or surfacing to a client).
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
