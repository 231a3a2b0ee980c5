//! `Projector` — the Change-Stream Projector (C2): a fixed pool of shard
//! tasks fed by `LISTEN catalog_changes` with a polling fallback, applying
//! version-guarded upserts/deletes to the shared search index.

use std::sync::Arc;
use std::time::Duration;

use core_catalog::CatalogStore;
use core_common::RetryPolicy;
use core_index::IndexClient;
use futures::future::join_all;
use sqlx::PgPool;
use tokio::sync::Notify;

use crate::error::Result;
use crate::metrics::ProjectorMetrics;
use crate::{listener, shard};

#[derive(Clone)]
pub struct Projector {
    pool: PgPool,
    catalog: CatalogStore,
    index: Arc<dyn IndexClient>,
    shard_count: i32,
    poll_interval: Duration,
    retry_policy: RetryPolicy,
    metrics: Arc<ProjectorMetrics>,
}

impl Projector {
    pub fn new(pool: PgPool, catalog: CatalogStore, index: Arc<dyn IndexClient>, shard_count: i32) -> Self {
        Self {
            pool,
            catalog,
            index,
            shard_count,
            poll_interval: Duration::from_secs(2),
            retry_policy: RetryPolicy::default(),
            metrics: Arc::new(ProjectorMetrics::new()),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Stale-upsert and similar counters (§7), readable independently of
    /// `run` so a caller (or a test) can observe them mid-flight.
    pub fn metrics(&self) -> Arc<ProjectorMetrics> {
        self.metrics.clone()
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Runs until the process is killed. Each shard task runs independently
    /// of the listener task — a dropped LISTEN connection degrades to
    /// polling, it does not stop ingestion (§6).
    pub async fn run(&self) {
        let wakeup = Arc::new(Notify::new());

        let mut handles = vec![tokio::spawn(listener::run(self.pool.clone(), wakeup.clone()))];

        handles.extend((0..self.shard_count).map(|shard| {
            tokio::spawn(shard::run(
                shard,
                self.shard_count,
                self.pool.clone(),
                self.catalog.clone(),
                self.index.clone(),
                self.retry_policy,
                self.metrics.clone(),
                wakeup.clone(),
                self.poll_interval,
            ))
        }));

        join_all(handles).await;
    }
}
