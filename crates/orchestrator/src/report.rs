//! Per-run summary (§4.5 "Reporting"). Mirrors the teacher's `SupervisorStats`
//! accumulate-as-you-go pattern: each stage adds its own counters, failures
//! are recorded rather than aborting the whole run where possible.

use std::time::Duration;

use crate::state::RunState;

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub scrape_run_id: String,
    pub final_state: Option<RunState>,
    pub studios_discovered: usize,
    pub studios_write_failed: usize,
    pub artists_found: usize,
    pub artists_queued: usize,
    pub artists_queue_failed: usize,
    pub artists_succeeded: usize,
    pub artists_dead_lettered: i64,
    pub discovering_took: Duration,
    pub finding_artists_took: Duration,
    pub enqueuing_took: Duration,
    pub draining_took: Duration,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run {}: {} studios discovered ({} failed), {} artists found, {} queued ({} failed), {} succeeded, {} dead-lettered",
            self.scrape_run_id,
            self.studios_discovered,
            self.studios_write_failed,
            self.artists_found,
            self.artists_queued,
            self.artists_queue_failed,
            self.artists_succeeded,
            self.artists_dead_lettered,
        )
    }
}
