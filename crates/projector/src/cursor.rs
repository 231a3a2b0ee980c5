//! Per-shard cursor persistence (§6). Advancing the cursor and applying the
//! index write are separate statements — a crash between them replays the
//! event, which the version-guarded upsert absorbs harmlessly.

use sqlx::PgPool;

use crate::error::Result;

pub async fn load(pool: &PgPool, shard: i32) -> Result<i64> {
    let seq: Option<i64> = sqlx::query_scalar("SELECT last_seq FROM projector_cursors WHERE shard = $1")
        .bind(shard)
        .fetch_optional(pool)
        .await?;
    Ok(seq.unwrap_or(0))
}

pub async fn advance(pool: &PgPool, shard: i32, seq: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO projector_cursors (shard, last_seq, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (shard) DO UPDATE SET last_seq = EXCLUDED.last_seq, updated_at = now()
        WHERE projector_cursors.last_seq < EXCLUDED.last_seq
        "#,
    )
    .bind(shard)
    .bind(seq)
    .execute(pool)
    .await?;
    Ok(())
}
