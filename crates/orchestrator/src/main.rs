use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use core_catalog::CatalogStore;
use core_common::Config;
use core_orchestrator::{LinkArtistFinder, Orchestrator, SeedListStudioSource};
use core_queue::JobQueue;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    core_common::logging::init("core=info");

    info!("orchestrator starting");

    let config = Config::orchestrator_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await?;
    let queue = JobQueue::new(pool);
    queue.migrate().await?;

    let seed_path = config
        .seed_studios_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SEED_STUDIOS_PATH environment variable is required"))?;
    let seed_json = std::fs::read_to_string(&seed_path)?;
    let studio_source = Arc::new(SeedListStudioSource::from_json_str(&seed_json)?);
    let artist_finder = Arc::new(LinkArtistFinder::new(config.fetch_timeout()));

    let orchestrator = Orchestrator::new(
        catalog,
        queue,
        studio_source,
        artist_finder,
        config.orchestrator_fanout,
    )
    .with_drain(Duration::from_secs(5), config.orchestrator_drain_timeout());

    loop {
        let report = orchestrator.run_once().await;
        info!(%report, "ingestion run finished");
        tokio::time::sleep(config.orchestrator_run_interval()).await;
    }
}
