use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use core_api::{build_router, AppState, IdempotencyStore};
use core_catalog::{CatalogStore, TakedownStore};
use core_common::Config;
use core_index::PostgresIndexClient;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    core_common::logging::init("core=info");

    let config = Config::api_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await?;
    let index = PostgresIndexClient::new(pool.clone());
    index.migrate().await?;
    let takedowns = TakedownStore::new(pool.clone());
    let idempotency = IdempotencyStore::new(pool.clone());
    idempotency.migrate().await?;

    let state = Arc::new(AppState::new(
        catalog,
        Arc::new(index),
        takedowns,
        idempotency,
        config.circuit_breaker_failure_threshold,
        Duration::from_secs(config.circuit_breaker_window_secs),
        Duration::from_secs(config.circuit_breaker_cooldown_secs),
    ));

    // Periodic takedown sweep (§4.6, §9 "safe default is hourly"); each
    // `POST /v1/takedowns` also triggers an on-demand sweep.
    {
        let state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                if let Err(e) = core_catalog::run_sweep(&state.takedowns, &state.catalog).await {
                    tracing::warn!(error = %e, "scheduled takedown sweep failed");
                }
            }
        });
    }

    let app = build_router(state);
    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("query API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
