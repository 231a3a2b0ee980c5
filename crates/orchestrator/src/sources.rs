//! Pluggable discovery surfaces. Same shape as the scout's `ContentFetcher`
//! trait (`async_trait`, no network/database in the trait itself) so tests
//! can supply deterministic fakes instead of hitting real sites.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioCandidate {
    pub name: String,
    pub website: String,
    pub city: String,
    pub geohash: String,
    pub discovery_source: String,
}

#[derive(Debug, Clone)]
pub struct ArtistCandidate {
    pub profile_url: String,
}

/// Finds candidate studios from whatever seed list/search the deployment
/// configures (§4.5 "Discovering"). One call per run.
#[async_trait]
pub trait StudioSource: Send + Sync {
    async fn discover_studios(&self) -> anyhow::Result<Vec<StudioCandidate>>;
}

/// Finds candidate artist profile URLs within a studio's site (§4.5
/// "FindingArtists"). Called once per discovered studio, fanned out under a
/// bounded semaphore.
#[async_trait]
pub trait ArtistFinder: Send + Sync {
    async fn find_artists(&self, studio_website: &str) -> anyhow::Result<Vec<ArtistCandidate>>;
}
