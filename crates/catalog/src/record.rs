//! The catalog's entity types (§3). Each maps onto one or more rows of the
//! single `catalog_records` table via `CatalogStore`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Studio {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub city: String,
    pub geohash: String,
    pub discovery_source: String,
    pub opted_out: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub styles: Vec<String>,
    pub contact_handle: Option<String>,
    pub portfolio_url: Option<String>,
    pub home_studio_id: Option<Uuid>,
    pub geohash: String,
    pub opted_out: bool,
    pub last_scrape_at: Option<DateTime<Utc>>,
    pub last_successful_scrape_id: Option<String>,
    /// Monotonic version counter advanced on every successful write (§3).
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioImage {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub style_tags: Vec<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Controlled-vocabulary style term. Static reference data, versioned
/// out-of-band (§3); only `aliases` is consulted during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub id: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub difficulty: Difficulty,
    pub popularity: u32,
    pub characteristic_tags: Vec<String>,
    pub origin_epoch: Option<u32>,
}

impl Style {
    /// Resolves a free-text style token against this term's canonical id
    /// and aliases, case-insensitively.
    pub fn matches(&self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        self.id.to_lowercase() == token
            || self.display_name.to_lowercase() == token
            || self.aliases.iter().any(|a| a.to_lowercase() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakedownStatus {
    Pending,
    Applied,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakedownRequest {
    pub artist_id: Uuid,
    pub requester: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub status: TakedownStatus,
}

/// A full artist record together with its current portfolio image set, as
/// returned by `CatalogStore::get_artist` and consumed by the projector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistWithImages {
    pub artist: Artist,
    pub images: Vec<PortfolioImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_matches_alias_case_insensitively() {
        let style = Style {
            id: "old_school".into(),
            display_name: "Old School".into(),
            aliases: vec!["Traditional".into(), "Americana".into()],
            difficulty: Difficulty::Beginner,
            popularity: 80,
            characteristic_tags: vec![],
            origin_epoch: None,
        };
        assert!(style.matches("traditional"));
        assert!(style.matches("OLD_SCHOOL"));
        assert!(!style.matches("japanese"));
    }
}
