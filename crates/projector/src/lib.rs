//! The Change-Stream Projector (C2): drains `catalog_change_events` and
//! keeps the search index eventually consistent with the catalog.

mod apply;
mod cursor;
mod error;
mod listener;
mod metrics;
mod projector;
mod shard;

pub use apply::apply_event;
pub use error::{ProjectorError, Result};
pub use metrics::ProjectorMetrics;
pub use projector::Projector;
