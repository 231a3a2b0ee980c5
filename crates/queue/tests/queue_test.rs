//! Integration tests for `JobQueue`.
//! Requires a Postgres instance. Set `DATABASE_TEST_URL`, or these are skipped.

use std::time::Duration;

use core_queue::{JobQueue, ScrapeJobInput};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_queue() -> Option<JobQueue> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let queue = JobQueue::new(pool.clone());
    queue.migrate().await.ok()?;
    sqlx::query("TRUNCATE scrape_jobs, scrape_jobs_dead_letter")
        .execute(&pool)
        .await
        .ok()?;
    Some(queue)
}

fn job(run_id: &str) -> ScrapeJobInput {
    ScrapeJobInput {
        scrape_run_id: run_id.to_string(),
        artist_id: Uuid::new_v4(),
        studio_id: None,
        target_url: "https://x.test/artist".to_string(),
    }
}

#[tokio::test]
async fn enqueue_then_receive_round_trips_message() {
    let Some(queue) = test_queue().await else { return };
    let results = queue.enqueue_batch(&[job("run-1")]).await.unwrap();
    assert_eq!(results.len(), 1);

    let received = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(500))
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].scrape_run_id, "run-1");
}

#[tokio::test]
async fn received_message_is_invisible_until_timeout_expires() {
    let Some(queue) = test_queue().await else { return };
    queue.enqueue_batch(&[job("run-1")]).await.unwrap();

    let first = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(500))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(300))
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn acknowledge_removes_message_permanently() {
    let Some(queue) = test_queue().await else { return };
    queue.enqueue_batch(&[job("run-1")]).await.unwrap();
    let received = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(500))
        .await
        .unwrap();
    let msg = &received[0];

    queue.acknowledge(msg.id, msg.receipt_handle).await.unwrap();
    assert_eq!(queue.depth_for_run("run-1").await.unwrap(), 0);
}

#[tokio::test]
async fn stale_receipt_handle_cannot_acknowledge_after_redelivery() {
    let Some(queue) = test_queue().await else { return };
    queue.enqueue_batch(&[job("run-1")]).await.unwrap();

    let first = queue
        .receive(10, Duration::from_millis(50), Duration::from_millis(500))
        .await
        .unwrap();
    let stale_handle = first[0].receipt_handle;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let redelivered = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(500))
        .await
        .unwrap();
    assert_eq!(redelivered.len(), 1);

    let ack_result = queue.acknowledge(first[0].id, stale_handle).await;
    assert!(ack_result.is_err());
    let _ = redelivered;
}

#[tokio::test]
async fn fail_permanent_dead_letters_after_attempt_cap() {
    let Some(queue) = test_queue().await else { return };
    queue.enqueue_batch(&[job("run-1")]).await.unwrap();

    let mut msg = queue
        .receive(10, Duration::from_secs(30), Duration::from_millis(500))
        .await
        .unwrap()
        .remove(0);

    for _ in 0..2 {
        let dead_lettered = queue
            .fail_permanent(msg.id, msg.receipt_handle, 3, "unreachable host")
            .await
            .unwrap();
        assert!(!dead_lettered);
        msg = queue
            .receive(10, Duration::from_secs(30), Duration::from_millis(500))
            .await
            .unwrap()
            .remove(0);
    }

    let dead_lettered = queue
        .fail_permanent(msg.id, msg.receipt_handle, 3, "unreachable host")
        .await
        .unwrap();
    assert!(dead_lettered);
    assert_eq!(queue.dead_lettered_count_for_run("run-1").await.unwrap(), 1);
}
