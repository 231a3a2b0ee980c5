//! At-least-once work distribution between the orchestrator and workers
//! (C3, §4.3).

pub mod error;
pub mod message;
pub mod queue;

pub use error::{QueueError, Result};
pub use message::{EnqueueResult, ScrapeJobInput, ScrapeJobMessage};
pub use queue::{JobQueue, MAX_BATCH_SIZE};
