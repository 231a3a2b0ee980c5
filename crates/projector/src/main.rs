use std::sync::Arc;

use anyhow::Result;
use core_catalog::CatalogStore;
use core_common::Config;
use core_index::PostgresIndexClient;
use core_projector::Projector;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    core_common::logging::init("core=info");

    info!("change-stream projector starting");

    let config = Config::projector_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await?;
    let index = PostgresIndexClient::new(pool.clone());
    index.migrate().await?;

    let projector = Projector::new(pool.clone(), catalog, Arc::new(index), config.projector_shard_count)
        .with_poll_interval(config.projector_poll_interval());
    projector.migrate().await?;

    projector.run().await;
    Ok(())
}
