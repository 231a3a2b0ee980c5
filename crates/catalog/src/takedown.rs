//! `TakedownRequest` persistence and the periodic sweep that applies them
//! (§3, §4.6, §8 "Takedown" scenario).

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::record::TakedownStatus;
use crate::store::CatalogStore;

#[derive(Clone)]
pub struct TakedownStore {
    pool: PgPool,
}

impl TakedownStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, artist_id: Uuid, requester: &str, reason: &str) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO takedown_requests (artist_id, requester, reason) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(artist_id)
        .bind(requester)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn pending(&self) -> Result<Vec<(Uuid, Uuid, String)>> {
        let rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            "SELECT id, artist_id, reason FROM takedown_requests WHERE status = 'pending'",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_applied(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE takedown_requests SET status = $1 WHERE id = $2")
            .bind(status_str(TakedownStatus::Applied))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn status_str(status: TakedownStatus) -> &'static str {
    match status {
        TakedownStatus::Pending => "pending",
        TakedownStatus::Applied => "applied",
        TakedownStatus::Rejected => "rejected",
    }
}

/// Runs the takedown sweep: applies every pending request by flipping
/// `opted_out` on the target Artist (which in turn emits a `REMOVE` change
/// event that the projector uses to delete the index document). Safe
/// default cadence is hourly with an on-demand trigger after each
/// `POST /v1/takedowns` (§9 Open Questions).
pub async fn run_sweep(takedowns: &TakedownStore, catalog: &CatalogStore) -> Result<usize> {
    let pending = takedowns.pending().await?;
    let applied_at = Utc::now();
    let mut applied = 0;
    for (id, artist_id, reason) in pending {
        catalog.mark_opted_out(artist_id, &reason).await?;
        takedowns.mark_applied(id).await?;
        applied += 1;
    }
    info!(applied, at = %applied_at, "takedown sweep complete");
    Ok(applied)
}
