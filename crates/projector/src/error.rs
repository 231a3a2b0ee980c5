use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("index error: {0}")]
    Index(#[from] core_index::IndexError),

    #[error("malformed change event {seq}: {reason}")]
    MalformedEvent { seq: i64, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ProjectorError>;
