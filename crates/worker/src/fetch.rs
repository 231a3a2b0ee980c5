//! `PageFetcher` — the fetch side of the scrape pipeline. Same shape as the
//! teacher's `PageScraper` trait (`scrape(url) -> Result<String>`), built on
//! `reqwest` with a bounded timeout and redirect count instead of a headless
//! browser, since studio/artist pages are server-rendered (§4.4).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::{Result, WorkerError};

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration, max_redirects: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(max_redirects))
            .user_agent("tattoo-catalog-scrape-worker/0.1")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| WorkerError::Fetch { url: url.to_string(), source })?;

        let response = response
            .error_for_status()
            .map_err(|source| WorkerError::Fetch { url: url.to_string(), source })?;

        response
            .text()
            .await
            .map_err(|source| WorkerError::Fetch { url: url.to_string(), source })
    }
}
