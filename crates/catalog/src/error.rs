use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("home studio {0} does not exist")]
    HomeStudioMissing(uuid::Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Outcome of a guarded write. `AlreadyApplied` is not an error (§4.1) — the
/// caller checks it explicitly rather than matching on `Result::Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied { version: i64 },
    AlreadyApplied,
}
