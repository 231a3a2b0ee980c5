use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error("queue error: {0}")]
    Queue(#[from] core_queue::QueueError),

    #[error("studio discovery failed: {0}")]
    Discovery(anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
