//! `Orchestrator` — the single coordinating loop for one ingestion run (C5).
//! Each stage logs its own outcome and feeds the next; a stage's partial
//! failure is recorded in the `RunReport` rather than aborting the run,
//! mirroring the teacher's `Supervisor::run_inner` phase accumulation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use core_catalog::{CatalogStore, Studio};
use core_queue::{JobQueue, ScrapeJobInput};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::report::RunReport;
use crate::sources::{ArtistFinder, StudioSource};
use crate::state::RunState;

pub struct Orchestrator {
    catalog: CatalogStore,
    queue: JobQueue,
    studio_source: Arc<dyn StudioSource>,
    artist_finder: Arc<dyn ArtistFinder>,
    /// Bounds concurrent `find_artists` calls (§4.5 "FindingArtists"),
    /// generalized from the teacher's `Semaphore::new(MAX_CONCURRENT_CHROME)`.
    fanout: usize,
    drain_poll_interval: Duration,
    drain_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        catalog: CatalogStore,
        queue: JobQueue,
        studio_source: Arc<dyn StudioSource>,
        artist_finder: Arc<dyn ArtistFinder>,
        fanout: usize,
    ) -> Self {
        Self {
            catalog,
            queue,
            studio_source,
            artist_finder,
            fanout,
            drain_poll_interval: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(3600),
        }
    }

    pub fn with_drain(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.drain_poll_interval = poll_interval;
        self.drain_timeout = timeout;
        self
    }

    /// Runs one full ingestion cycle, Idle through Reporting. Always returns
    /// a report, even on partial failure — `final_state` is `Failed` only
    /// when the run could not proceed at all (no studios, discovery error).
    pub async fn run_once(&self) -> RunReport {
        let scrape_run_id = Uuid::new_v4().to_string();
        let mut report = RunReport { scrape_run_id: scrape_run_id.clone(), ..Default::default() };

        let state = RunState::Discovering;
        info!(scrape_run_id, state = %state, "orchestration stage starting");
        let discover_start = Instant::now();
        let studios = match self.discover_studios(&mut report).await {
            Ok(studios) if !studios.is_empty() => studios,
            Ok(_) => {
                warn!(scrape_run_id, "no studios discovered, ending run");
                report.final_state = Some(RunState::Failed);
                return report;
            }
            Err(e) => {
                warn!(scrape_run_id, error = %e, "studio discovery failed, ending run");
                report.final_state = Some(RunState::Failed);
                return report;
            }
        };
        report.discovering_took = discover_start.elapsed();

        let state = RunState::FindingArtists;
        info!(scrape_run_id, state = %state, studios = studios.len(), "orchestration stage starting");
        let find_start = Instant::now();
        let candidates = self.find_artists(&studios).await;
        report.artists_found = candidates.len();
        report.finding_artists_took = find_start.elapsed();

        let state = RunState::Enqueuing;
        info!(scrape_run_id, state = %state, candidates = candidates.len(), "orchestration stage starting");
        let enqueue_start = Instant::now();
        self.enqueue(&scrape_run_id, &candidates, &mut report).await;
        report.enqueuing_took = enqueue_start.elapsed();

        let state = RunState::Draining;
        info!(scrape_run_id, state = %state, "orchestration stage starting");
        let drain_start = Instant::now();
        let remaining = self.drain(&scrape_run_id).await;
        report.draining_took = drain_start.elapsed();

        let state = RunState::Reporting;
        info!(scrape_run_id, state = %state, "orchestration stage starting");
        report.artists_dead_lettered =
            self.queue.dead_lettered_count_for_run(&scrape_run_id).await.unwrap_or(0);
        report.artists_succeeded = report
            .artists_queued
            .saturating_sub(report.artists_dead_lettered as usize)
            .saturating_sub(remaining as usize);

        // Any state → Failed on worker success rate < 50% of queued jobs
        // (§4.5). With nothing queued there is no rate to judge the run by,
        // so it stands as a normal empty run rather than a failed one.
        let success_rate = if report.artists_queued > 0 {
            report.artists_succeeded as f64 / report.artists_queued as f64
        } else {
            1.0
        };
        report.final_state = if success_rate < 0.5 { Some(RunState::Failed) } else { Some(RunState::Idle) };

        info!(%report, "orchestration run complete");
        report
    }

    async fn discover_studios(&self, report: &mut RunReport) -> Result<Vec<(Uuid, String)>> {
        let candidates = self
            .studio_source
            .discover_studios()
            .await
            .map_err(crate::error::OrchestratorError::Discovery)?;

        let mut written = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = Uuid::new_v4();
            let studio = Studio {
                id,
                name: candidate.name,
                website: Some(candidate.website.clone()),
                city: candidate.city,
                geohash: candidate.geohash,
                discovery_source: candidate.discovery_source,
                opted_out: false,
                created_at: Utc::now(),
            };
            match self.catalog.put_studio(&studio).await {
                Ok(()) => {
                    report.studios_discovered += 1;
                    written.push((id, candidate.website));
                }
                Err(e) => {
                    warn!(studio = %studio.name, error = %e, "failed to write discovered studio");
                    report.studios_write_failed += 1;
                }
            }
        }
        Ok(written)
    }

    async fn find_artists(&self, studios: &[(Uuid, String)]) -> Vec<(Uuid, String)> {
        let semaphore = Arc::new(Semaphore::new(self.fanout.max(1)));
        let tasks = studios.iter().cloned().map(|(studio_id, website)| {
            let semaphore = semaphore.clone();
            let finder = self.artist_finder.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                match finder.find_artists(&website).await {
                    Ok(found) => found
                        .into_iter()
                        .map(|c| (studio_id, c.profile_url))
                        .collect::<Vec<_>>(),
                    Err(e) => {
                        warn!(website, error = %e, "find_artists failed for studio");
                        Vec::new()
                    }
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }

    async fn enqueue(&self, scrape_run_id: &str, candidates: &[(Uuid, String)], report: &mut RunReport) {
        let jobs: Vec<ScrapeJobInput> = candidates
            .iter()
            .map(|(studio_id, url)| ScrapeJobInput {
                scrape_run_id: scrape_run_id.to_string(),
                artist_id: Uuid::new_v4(),
                studio_id: Some(*studio_id),
                target_url: url.clone(),
            })
            .collect();

        match self.queue.enqueue_batch(&jobs).await {
            Ok(results) => {
                for result in results {
                    match result {
                        core_queue::EnqueueResult::Ok(_) => report.artists_queued += 1,
                        core_queue::EnqueueResult::Failed { error, .. } => {
                            warn!(error, "failed to enqueue scrape job");
                            report.artists_queue_failed += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "batch enqueue failed entirely");
                report.artists_queue_failed += jobs.len();
            }
        }
    }

    /// Polls queue depth for this run until it hits zero or `drain_timeout`
    /// elapses. Returns the final observed depth (non-zero means timed out).
    async fn drain(&self, scrape_run_id: &str) -> i64 {
        let deadline = Instant::now() + self.drain_timeout;
        loop {
            let depth = self.queue.depth_for_run(scrape_run_id).await.unwrap_or(0);
            if depth == 0 || Instant::now() >= deadline {
                return depth;
            }
            tokio::time::sleep(self.drain_poll_interval).await;
        }
    }
}
