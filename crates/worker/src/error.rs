use core_common::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("fetch failed for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("fetch timed out for {0}")]
    Timeout(String),

    #[error("queue error: {0}")]
    Queue(#[from] core_queue::QueueError),

    #[error("catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkerError {
    /// Classifies a fetch failure against the shared error taxonomy (§7):
    /// connect/timeout and 5xx are transient and worth retrying in place;
    /// a 4xx is the page telling us no amount of retrying will help.
    pub fn classify(&self) -> CoreError {
        match self {
            WorkerError::Fetch { source, .. } => {
                if source.is_timeout() || source.is_connect() {
                    CoreError::Transient(source.to_string())
                } else if let Some(status) = source.status() {
                    if status.is_server_error() {
                        CoreError::Transient(format!("http {status}"))
                    } else {
                        CoreError::PermanentInput(format!("http {status}"))
                    }
                } else {
                    CoreError::Transient(source.to_string())
                }
            }
            WorkerError::Timeout(_) => CoreError::Transient(self.to_string()),
            WorkerError::Queue(_) => CoreError::Transient(self.to_string()),
            WorkerError::Catalog(e) => CoreError::PermanentInput(e.to_string()),
            WorkerError::Other(_) => CoreError::Transient(self.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
