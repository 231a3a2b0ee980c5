//! Counters for outcomes that never surface as an `Err` and would otherwise
//! go unobserved, the same `AtomicU64`-backed counter shape as the teacher's
//! `BudgetTracker` (§7 "emit a counter").

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ProjectorMetrics {
    stale_upserts: AtomicU64,
}

impl ProjectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded every time a version-guarded upsert is dropped as stale —
    /// an out-of-order or duplicate delivery that `PreconditionFailed`
    /// covers (§7, §8 "Index convergence").
    pub fn record_stale_upsert(&self) {
        self.stale_upserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_upserts(&self) -> u64 {
        self.stale_upserts.load(Ordering::Relaxed)
    }
}
