use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Outcome of a version-guarded upsert (§4.2, §8 "Index convergence").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Applied,
    /// The incoming version was not newer than the stored one — dropped,
    /// counted as a `PreconditionFailed` (§7, §8 scenario 3).
    Stale,
}
