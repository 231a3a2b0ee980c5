//! One tokio task per shard: reads its slice of `catalog_change_events` in
//! order, applies each to the index, and advances its cursor. Shards are
//! assigned by `hashtext(pk) % shard_count` so a single hot artist can't
//! starve the others (the same fan-out idea as `STYLE_SHARD_COUNT` in
//! `core-catalog`, applied to the consumer side instead of the writer).

use std::sync::Arc;
use std::time::Duration;

use core_catalog::{CatalogStore, ChangeEvent, ChangeEventType};
use core_common::RetryPolicy;
use core_index::IndexClient;
use sqlx::{PgPool, Row};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::apply::apply_event;
use crate::cursor;
use crate::metrics::ProjectorMetrics;

const BATCH_SIZE: i64 = 50;

pub async fn run(
    shard: i32,
    shard_count: i32,
    pool: PgPool,
    catalog: CatalogStore,
    index: Arc<dyn IndexClient>,
    retry_policy: RetryPolicy,
    metrics: Arc<ProjectorMetrics>,
    wakeup: Arc<Notify>,
    poll_interval: Duration,
) {
    let mut cursor = match cursor::load(&pool, shard).await {
        Ok(c) => c,
        Err(e) => {
            error!(shard, error = %e, "failed to load projector cursor, starting from 0");
            0
        }
    };

    loop {
        let batch = match fetch_batch(&pool, shard, shard_count, cursor).await {
            Ok(b) => b,
            Err(e) => {
                error!(shard, error = %e, "failed to fetch change events");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        if batch.is_empty() {
            tokio::select! {
                _ = wakeup.notified() => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
            continue;
        }

        for event in batch {
            let seq = event.seq;
            let event_type = event.event_type;
            let pk = event.key.pk.clone();

            let outcome = retry_policy
                .retry(|| apply_event(&event, &catalog, index.as_ref(), metrics.as_ref()))
                .await;

            match outcome {
                Ok(()) => {
                    info!(shard, seq, event_type = ?event_type, "projected change event");
                }
                Err(e) => {
                    warn!(shard, seq, error = %e, "dead-lettering poisoned change event");
                    if let Err(e) = dead_letter(&pool, shard, seq, event_type, &pk, &e.to_string()).await {
                        error!(shard, seq, error = %e, "failed to record dead letter");
                    }
                }
            }

            cursor = seq;
            if let Err(e) = cursor::advance(&pool, shard, cursor).await {
                error!(shard, seq, error = %e, "failed to advance projector cursor");
            }
        }
    }
}

async fn fetch_batch(
    pool: &PgPool,
    shard: i32,
    shard_count: i32,
    cursor: i64,
) -> crate::error::Result<Vec<ChangeEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT seq, event_type, pk, sk, version, payload
        FROM catalog_change_events
        WHERE seq > $1 AND abs(hashtext(pk)) % $2 = $3
        ORDER BY seq ASC
        LIMIT $4
        "#,
    )
    .bind(cursor)
    .bind(shard_count)
    .bind(shard)
    .bind(BATCH_SIZE)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let event_type_str: String = row.try_get("event_type")?;
            let event_type = match event_type_str.as_str() {
                "INSERT" => ChangeEventType::Insert,
                "MODIFY" => ChangeEventType::Modify,
                "REMOVE" => ChangeEventType::Remove,
                other => {
                    return Err(sqlx::Error::Decode(
                        format!("unknown event_type {other}").into(),
                    ))
                }
            };
            Ok(ChangeEvent {
                seq: row.try_get("seq")?,
                event_type,
                key: core_catalog::RecordKey { pk: row.try_get("pk")?, sk: row.try_get("sk")? },
                version: row.try_get("version")?,
                new_image: row.try_get("payload")?,
            })
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
        .map_err(Into::into)
}

async fn dead_letter(
    pool: &PgPool,
    shard: i32,
    seq: i64,
    event_type: ChangeEventType,
    pk: &str,
    error: &str,
) -> crate::error::Result<()> {
    let event_type_str = match event_type {
        ChangeEventType::Insert => "INSERT",
        ChangeEventType::Modify => "MODIFY",
        ChangeEventType::Remove => "REMOVE",
    };
    sqlx::query(
        r#"
        INSERT INTO projector_dead_letters (seq, shard, event_type, pk, error)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (seq) DO NOTHING
        "#,
    )
    .bind(seq)
    .bind(shard)
    .bind(event_type_str)
    .bind(pk)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}
