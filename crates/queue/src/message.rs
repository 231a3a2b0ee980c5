//! Queue message format (§6). Every message carries `scrapeRunId`, shared
//! across all jobs of a single orchestration run, so the catalog's
//! conditional-write guard (§4.1) can deduplicate replays.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJobInput {
    pub scrape_run_id: String,
    pub artist_id: Uuid,
    pub studio_id: Option<Uuid>,
    pub target_url: String,
}

/// A message handed to a worker by `receive`. `receipt_handle` changes on
/// every redelivery, so a stale handle can never acknowledge or extend a
/// message that has since been redelivered to someone else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJobMessage {
    pub id: Uuid,
    pub scrape_run_id: String,
    pub artist_id: Uuid,
    pub studio_id: Option<Uuid>,
    pub target_url: String,
    pub attempt: i32,
    pub receipt_handle: Uuid,
}

/// Per-message outcome of a batched enqueue, so partial failure within a
/// batch can be retried without re-enqueueing the whole batch (§4.3).
#[derive(Debug, Clone)]
pub enum EnqueueResult {
    Ok(Uuid),
    Failed { input_index: usize, error: String },
}
