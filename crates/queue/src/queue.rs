//! `JobQueue` — at-least-once work distribution with visibility-timeout
//! semantics, batched enqueue, and a dead-letter sink (§4.3).

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::{QueueError, Result};
use crate::message::{EnqueueResult, ScrapeJobInput, ScrapeJobMessage};

/// Messages are grouped into batches of up to this size for efficiency
/// (§4.3).
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueueError::Other(e.into()))?;
        Ok(())
    }

    /// Enqueues jobs in batches of up to `MAX_BATCH_SIZE`, returning a
    /// per-message result so a partial batch failure can be retried
    /// without re-enqueueing the whole batch.
    pub async fn enqueue_batch(&self, jobs: &[ScrapeJobInput]) -> Result<Vec<EnqueueResult>> {
        let mut results = Vec::with_capacity(jobs.len());
        for chunk in jobs.chunks(MAX_BATCH_SIZE) {
            for (offset, job) in chunk.iter().enumerate() {
                let index = results.len() + offset;
                match self.enqueue_one(job).await {
                    Ok(id) => results.push(EnqueueResult::Ok(id)),
                    Err(e) => {
                        warn!(error = %e, "enqueue failed for job");
                        results.push(EnqueueResult::Failed {
                            input_index: index,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
        Ok(results)
    }

    async fn enqueue_one(&self, job: &ScrapeJobInput) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO scrape_jobs (scrape_run_id, artist_id, studio_id, target_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&job.scrape_run_id)
        .bind(job.artist_id)
        .bind(job.studio_id)
        .bind(&job.target_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Blocking long-poll: repeatedly tries to claim up to `max_messages`
    /// not-yet-visible jobs via `SKIP LOCKED`, backing off briefly between
    /// empty polls, until messages are found or `max_wait` elapses.
    pub async fn receive(
        &self,
        max_messages: i64,
        visibility_timeout: Duration,
        max_wait: Duration,
    ) -> Result<Vec<ScrapeJobMessage>> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            let claimed = self.try_claim(max_messages, visibility_timeout).await?;
            if !claimed.is_empty() || tokio::time::Instant::now() >= deadline {
                return Ok(claimed);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn try_claim(
        &self,
        max_messages: i64,
        visibility_timeout: Duration,
    ) -> Result<Vec<ScrapeJobMessage>> {
        let mut tx = self.pool.begin().await?;
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM scrape_jobs
            WHERE visible_at <= now()
            ORDER BY enqueued_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(max_messages)
        .fetch_all(&mut *tx)
        .await?;

        if ids.is_empty() {
            tx.rollback().await?;
            return Ok(vec![]);
        }

        let visible_at = Utc::now() + visibility_timeout;
        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            let receipt_handle = Uuid::new_v4();
            let row: (String, Uuid, Option<Uuid>, String, i32) = sqlx::query_as(
                r#"
                UPDATE scrape_jobs
                SET visible_at = $1, receipt_handle = $2
                WHERE id = $3
                RETURNING scrape_run_id, artist_id, studio_id, target_url, attempt
                "#,
            )
            .bind(visible_at)
            .bind(receipt_handle)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            messages.push(ScrapeJobMessage {
                id,
                scrape_run_id: row.0,
                artist_id: row.1,
                studio_id: row.2,
                target_url: row.3,
                attempt: row.4,
                receipt_handle,
            });
        }

        tx.commit().await?;
        Ok(messages)
    }

    /// Deletes the message permanently. Only succeeds if `receipt_handle`
    /// matches the current one (it has not been redelivered since).
    pub async fn acknowledge(&self, id: Uuid, receipt_handle: Uuid) -> Result<()> {
        let affected = sqlx::query("DELETE FROM scrape_jobs WHERE id = $1 AND receipt_handle = $2")
            .bind(id)
            .bind(receipt_handle)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(QueueError::ReceiptMismatch);
        }
        Ok(())
    }

    /// Extends the visibility timeout by `extra`. Used when a fetch/parse
    /// is taking longer than `T/2` (§4.4).
    pub async fn extend(&self, id: Uuid, receipt_handle: Uuid, extra: Duration) -> Result<()> {
        let new_visible_at = Utc::now() + extra;
        let affected = sqlx::query(
            "UPDATE scrape_jobs SET visible_at = $1 WHERE id = $2 AND receipt_handle = $3",
        )
        .bind(new_visible_at)
        .bind(id)
        .bind(receipt_handle)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(QueueError::ReceiptMismatch);
        }
        Ok(())
    }

    /// Releases the message with no progress (rate-limit backoff, §4.4
    /// step 3): makes it immediately visible again without bumping the
    /// attempt counter.
    pub async fn release_no_progress(&self, id: Uuid, receipt_handle: Uuid) -> Result<()> {
        sqlx::query("UPDATE scrape_jobs SET visible_at = now() WHERE id = $1 AND receipt_handle = $2")
            .bind(id)
            .bind(receipt_handle)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a permanent-failure attempt. Once `max_attempts` is reached
    /// the job is moved to the dead-letter sink and removed from the
    /// active queue; otherwise it is returned to the queue to be retried.
    /// Returns `true` if the job was dead-lettered.
    pub async fn fail_permanent(
        &self,
        id: Uuid,
        receipt_handle: Uuid,
        max_attempts: i32,
        error: &str,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(String, Uuid, Option<Uuid>, String, i32)> = sqlx::query_as(
            r#"
            UPDATE scrape_jobs
            SET attempt = attempt + 1, visible_at = now()
            WHERE id = $1 AND receipt_handle = $2
            RETURNING scrape_run_id, artist_id, studio_id, target_url, attempt
            "#,
        )
        .bind(id)
        .bind(receipt_handle)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((scrape_run_id, artist_id, studio_id, target_url, attempt)) = row else {
            tx.rollback().await?;
            return Err(QueueError::ReceiptMismatch);
        };

        if attempt < max_attempts {
            tx.commit().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO scrape_jobs_dead_letter
                (id, scrape_run_id, artist_id, studio_id, target_url, attempt, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&scrape_run_id)
        .bind(artist_id)
        .bind(studio_id)
        .bind(&target_url)
        .bind(attempt)
        .bind(error)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM scrape_jobs WHERE id = $1").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Total active (queued + in-flight) jobs for a run — used by the
    /// orchestrator's `Draining → Reporting` transition (§4.5).
    pub async fn depth_for_run(&self, scrape_run_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scrape_jobs WHERE scrape_run_id = $1")
                .bind(scrape_run_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count of jobs dead-lettered for a run, for run-report aggregation.
    pub async fn dead_lettered_count_for_run(&self, scrape_run_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scrape_jobs_dead_letter WHERE scrape_run_id = $1",
        )
        .bind(scrape_run_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
