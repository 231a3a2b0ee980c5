use std::sync::Arc;

use anyhow::Result;
use core_catalog::CatalogStore;
use core_common::{Config, HostRateLimiter, RetryPolicy};
use core_queue::JobQueue;
use core_worker::{ReqwestFetcher, ScrapeWorker};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    core_common::logging::init("core=info");

    info!("scrape worker pool starting");

    let config = Config::worker_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await?;
    let style_catalog = catalog.list_styles().await?;
    let queue = JobQueue::new(pool);
    queue.migrate().await?;

    let fetcher = Arc::new(ReqwestFetcher::new(
        config.fetch_timeout(),
        config.max_redirects,
    )?);
    let rate_limiter = Arc::new(HostRateLimiter::new(
        config.rate_limit_tokens_per_sec,
        config.rate_limit_burst,
    ));

    let worker = Arc::new(ScrapeWorker::new(
        queue,
        catalog,
        fetcher,
        rate_limiter,
        config.visibility_timeout(),
        config.max_attempts as i32,
        RetryPolicy::default(),
        style_catalog,
    ));

    // All tasks run the same worker instance concurrently — the per-host
    // rate limiter and circuit breakers are meant to be shared, not
    // duplicated per task (§5 "shared resources").
    let mut handles = Vec::with_capacity(config.worker_concurrency);
    for _ in 0..config.worker_concurrency {
        let worker = worker.clone();
        handles.push(tokio::spawn(async move { worker.run().await }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
