//! `ScrapeWorker` — the Scrape Worker Pool (C4): receive → rate-limit-gate →
//! circuit-breaker-gate → fetch (with visibility extension) → parse →
//! conditional catalog write → acknowledge. A single job's failure never
//! takes the worker down; every path ends in ack, release, or dead-letter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use core_catalog::{Artist, CatalogStore, PortfolioImage, Style};
use core_common::{CircuitBreaker, HostRateLimiter, RetryPolicy};
use core_queue::{JobQueue, ScrapeJobMessage};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::parse::parse_artist_page;

pub struct ScrapeWorker {
    queue: JobQueue,
    catalog: CatalogStore,
    fetcher: Arc<dyn PageFetcher>,
    rate_limiter: Arc<HostRateLimiter>,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
    visibility_timeout: Duration,
    max_attempts: i32,
    retry_policy: RetryPolicy,
    style_catalog: Vec<Style>,
}

impl ScrapeWorker {
    pub fn new(
        queue: JobQueue,
        catalog: CatalogStore,
        fetcher: Arc<dyn PageFetcher>,
        rate_limiter: Arc<HostRateLimiter>,
        visibility_timeout: Duration,
        max_attempts: i32,
        retry_policy: RetryPolicy,
        style_catalog: Vec<Style>,
    ) -> Self {
        Self {
            queue,
            catalog,
            fetcher,
            rate_limiter,
            breakers: Mutex::new(HashMap::new()),
            visibility_timeout,
            max_attempts,
            retry_policy,
            style_catalog,
        }
    }

    /// Runs until the process is killed, repeatedly long-polling the queue
    /// and processing whatever batch comes back.
    pub async fn run(&self) {
        loop {
            let messages = match self
                .queue
                .receive(10, self.visibility_timeout, Duration::from_secs(20))
                .await
            {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "failed to receive from queue, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            for message in messages {
                if let Err(e) = self.process(message).await {
                    warn!(error = %e, "unhandled error processing scrape job");
                }
            }
        }
    }

    async fn process(&self, message: ScrapeJobMessage) -> Result<()> {
        let host = Url::parse(&message.target_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let breaker = self.breaker_for(&host);
        if let Err(retry_after) = breaker.check() {
            info!(host, retry_after_secs = retry_after.as_secs(), "circuit open, releasing job");
            self.queue.release_no_progress(message.id, message.receipt_handle).await?;
            return Ok(());
        }

        if !self.rate_limiter.try_acquire(&host) {
            self.queue.release_no_progress(message.id, message.receipt_handle).await?;
            return Ok(());
        }

        let html = match self.fetch_with_retry(&message).await {
            Ok(html) => {
                breaker.record_success();
                html
            }
            Err(e) => {
                breaker.record_failure();
                if e.classify().is_retryable() {
                    info!(url = %message.target_url, error = %e, "transient fetch failure exhausted retry budget, releasing job");
                    self.queue.release_no_progress(message.id, message.receipt_handle).await?;
                } else {
                    self.fail(&message, &e.to_string()).await?;
                }
                return Ok(());
            }
        };

        let Some(parsed) = parse_artist_page(&html, &message.target_url, &self.style_catalog) else {
            info!(url = %message.target_url, "empty parse, acknowledging without catalog write");
            self.queue.acknowledge(message.id, message.receipt_handle).await?;
            return Ok(());
        };

        let geohash = self.resolve_geohash(message.studio_id).await;
        let artist = Artist {
            id: message.artist_id,
            name: parsed.name,
            styles: parsed.styles,
            contact_handle: parsed.contact_handle,
            portfolio_url: Some(message.target_url.clone()),
            home_studio_id: message.studio_id,
            geohash,
            opted_out: false,
            last_scrape_at: None,
            last_successful_scrape_id: None,
            version: 0,
        };
        let images: Vec<PortfolioImage> = parsed
            .image_urls
            .into_iter()
            .map(|url| PortfolioImage {
                id: Uuid::new_v4(),
                artist_id: message.artist_id,
                source_url: url,
                thumbnail_url: None,
                style_tags: artist.styles.clone(),
                width: None,
                height: None,
                ingested_at: Utc::now(),
            })
            .collect();

        match self.catalog.put_artist(&artist, &images, &message.scrape_run_id).await {
            Ok(outcome) => {
                info!(artist_id = %message.artist_id, outcome = ?outcome, "catalog write applied");
                self.queue.acknowledge(message.id, message.receipt_handle).await?;
            }
            Err(e) => self.fail(&message, &e.to_string()).await?,
        }

        Ok(())
    }

    /// Retries a transient fetch failure inline, with backoff, up to
    /// `retry_policy`'s attempt cap — a permanent failure (4xx) returns
    /// immediately instead of burning the budget (§7, §4.4 step 7).
    async fn fetch_with_retry(&self, message: &ScrapeJobMessage) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_with_extension(message).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    attempt += 1;
                    if !e.classify().is_retryable() || attempt >= self.retry_policy.max_attempts {
                        return Err(e);
                    }
                    warn!(url = %message.target_url, attempt, error = %e, "transient fetch failure, retrying inline");
                    tokio::time::sleep(self.retry_policy.delay_for(attempt)).await;
                }
            }
        }
    }

    async fn fetch_with_extension(&self, message: &ScrapeJobMessage) -> Result<String> {
        let half = self.visibility_timeout / 2;
        let fetch_fut = self.fetcher.fetch(&message.target_url);
        tokio::pin!(fetch_fut);

        loop {
            tokio::select! {
                result = &mut fetch_fut => return result,
                _ = tokio::time::sleep(half) => {
                    if let Err(e) = self.queue.extend(message.id, message.receipt_handle, self.visibility_timeout).await {
                        warn!(error = %e, "failed to extend visibility timeout mid-fetch");
                    }
                }
            }
        }
    }

    async fn resolve_geohash(&self, studio_id: Option<Uuid>) -> String {
        let Some(studio_id) = studio_id else { return String::new() };
        match self.catalog.get_studio(studio_id).await {
            Ok(Some(studio)) => studio.geohash,
            _ => String::new(),
        }
    }

    async fn fail(&self, message: &ScrapeJobMessage, error: &str) -> Result<()> {
        let dead_lettered = self
            .queue
            .fail_permanent(message.id, message.receipt_handle, self.max_attempts, error)
            .await?;
        if dead_lettered {
            warn!(artist_id = %message.artist_id, url = %message.target_url, error, "job dead-lettered");
        }
        Ok(())
    }

    fn breaker_for(&self, host: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap();
        breakers
            .entry(host.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(5, Duration::from_secs(60), Duration::from_secs(30)))
            })
            .clone()
    }
}
