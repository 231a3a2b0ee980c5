//! Bridges Postgres `LISTEN catalog_changes` notifications to the shard
//! tasks via a shared `Notify`. This is the low-latency path; each shard
//! still falls back to polling on its own interval if a notification is
//! missed, so correctness never depends on this task staying alive.

use std::sync::Arc;

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::Notify;
use tracing::{error, warn};

pub async fn run(pool: PgPool, wakeup: Arc<Notify>) {
    loop {
        match PgListener::connect_with(&pool).await {
            Ok(mut listener) => {
                if let Err(e) = listener.listen("catalog_changes").await {
                    warn!(error = %e, "failed to LISTEN catalog_changes, falling back to polling only");
                    return;
                }
                loop {
                    match listener.recv().await {
                        Ok(_) => wakeup.notify_waiters(),
                        Err(e) => {
                            error!(error = %e, "lost LISTEN connection, reconnecting");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "could not establish LISTEN connection, falling back to polling only");
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}
