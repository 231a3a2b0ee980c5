//! End-to-end worker test against a fake fetcher and a real Postgres queue
//! and catalog. Requires `DATABASE_TEST_URL`; skipped otherwise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use core_catalog::CatalogStore;
use core_common::{HostRateLimiter, RetryPolicy};
use core_queue::{JobQueue, ScrapeJobInput};
use core_worker::{PageFetcher, Result as WorkerResult, ScrapeWorker};
use sqlx::PgPool;
use uuid::Uuid;

struct FakeFetcher;

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> WorkerResult<String> {
        Ok(r#"
            <html><body>
                <h1>Jane Doe</h1>
                <p>Traditional and blackwork work.</p>
                <a href="https://instagram.com/jane.ink">ig</a>
                <img src="/a.jpg">
            </body></html>
        "#
        .to_string())
    }
}

async fn test_env() -> Option<(PgPool, CatalogStore, JobQueue)> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await.ok()?;
    let queue = JobQueue::new(pool.clone());
    queue.migrate().await.ok()?;
    sqlx::query("TRUNCATE catalog_records, catalog_change_events, scrape_jobs, scrape_jobs_dead_letter")
        .execute(&pool)
        .await
        .ok()?;
    Some((pool, catalog, queue))
}

#[tokio::test]
async fn scrapes_and_writes_artist_to_catalog() {
    let Some((_pool, catalog, queue)) = test_env().await else { return };
    let artist_id = Uuid::new_v4();

    queue
        .enqueue_batch(&[ScrapeJobInput {
            scrape_run_id: "run-worker-1".to_string(),
            artist_id,
            studio_id: None,
            target_url: "https://studio.example.com/artists/jane".to_string(),
        }])
        .await
        .unwrap();

    let style_catalog = catalog.list_styles().await.unwrap();
    let worker = ScrapeWorker::new(
        queue,
        catalog.clone(),
        Arc::new(FakeFetcher),
        Arc::new(HostRateLimiter::new(100.0, 10)),
        Duration::from_secs(30),
        3,
        RetryPolicy::default(),
        style_catalog,
    );
    let handle = tokio::spawn(async move { worker.run().await });

    let mut found = None;
    for _ in 0..50 {
        if let Some(a) = catalog.get_artist(artist_id).await.unwrap() {
            found = Some(a);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    handle.abort();

    let with_images = found.expect("artist should have been written to the catalog");
    assert_eq!(with_images.artist.name, "Jane Doe");
    assert!(with_images.artist.styles.contains(&"old_school".to_string()));
    assert_eq!(with_images.artist.contact_handle.as_deref(), Some("jane.ink"));
    assert_eq!(with_images.images.len(), 1);
}
