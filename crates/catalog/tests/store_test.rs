//! Integration tests for `CatalogStore`.
//! Requires a Postgres instance. Set `DATABASE_TEST_URL`, or these are skipped.

use chrono::Utc;
use core_catalog::{Artist, CatalogStore, PortfolioImage, Studio, WriteOutcome};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_store() -> Option<CatalogStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let store = CatalogStore::new(pool.clone());
    store.migrate().await.ok()?;
    sqlx::query("TRUNCATE catalog_records, catalog_change_events, takedown_requests")
        .execute(&pool)
        .await
        .ok()?;
    Some(store)
}

fn jane(id: Uuid) -> (Artist, Vec<PortfolioImage>) {
    let artist = Artist {
        id,
        name: "Jane".to_string(),
        styles: vec!["old_school".to_string()],
        contact_handle: Some("jane.ink".to_string()),
        portfolio_url: None,
        home_studio_id: None,
        geohash: "9vfgzgg8".to_string(),
        opted_out: false,
        last_scrape_at: None,
        last_successful_scrape_id: None,
        version: 0,
    };
    let images = vec![
        PortfolioImage {
            id: Uuid::new_v4(),
            artist_id: id,
            source_url: "u1".to_string(),
            thumbnail_url: None,
            style_tags: vec![],
            width: None,
            height: None,
            ingested_at: Utc::now(),
        },
        PortfolioImage {
            id: Uuid::new_v4(),
            artist_id: id,
            source_url: "u2".to_string(),
            thumbnail_url: None,
            style_tags: vec![],
            width: None,
            height: None,
            ingested_at: Utc::now(),
        },
    ];
    (artist, images)
}

#[tokio::test]
async fn happy_path_ingestion_creates_version_one_with_two_images() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (artist, images) = jane(id);

    let outcome = store.put_artist(&artist, &images, "run-1").await.unwrap();
    assert_eq!(outcome, WriteOutcome::Applied { version: 1 });

    let fetched = store.get_artist(id).await.unwrap().unwrap();
    assert_eq!(fetched.artist.version, 1);
    assert_eq!(fetched.images.len(), 2);
}

#[tokio::test]
async fn duplicate_scrape_run_id_is_already_applied_and_catalog_unchanged() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (artist, images) = jane(id);

    let first = store.put_artist(&artist, &images, "run-1").await.unwrap();
    assert_eq!(first, WriteOutcome::Applied { version: 1 });

    let second = store.put_artist(&artist, &images, "run-1").await.unwrap();
    assert_eq!(second, WriteOutcome::AlreadyApplied);

    let fetched = store.get_artist(id).await.unwrap().unwrap();
    assert_eq!(fetched.artist.version, 1);
}

#[tokio::test]
async fn version_never_decreases_across_successive_runs() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (artist, images) = jane(id);

    store.put_artist(&artist, &images, "run-1").await.unwrap();
    let second = store.put_artist(&artist, &images, "run-2").await.unwrap();
    assert_eq!(second, WriteOutcome::Applied { version: 2 });

    let fetched = store.get_artist(id).await.unwrap().unwrap();
    assert_eq!(fetched.artist.version, 2);
}

#[tokio::test]
async fn put_artist_rejects_missing_home_studio() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (mut artist, images) = jane(id);
    artist.home_studio_id = Some(Uuid::new_v4());

    let result = store.put_artist(&artist, &images, "run-1").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn put_artist_succeeds_when_home_studio_exists() {
    let Some(store) = test_store().await else { return };
    let studio_id = Uuid::new_v4();
    store
        .put_studio(&Studio {
            id: studio_id,
            name: "Ink & Iron".to_string(),
            website: Some("https://x.test".to_string()),
            city: "Minneapolis".to_string(),
            geohash: "9vfgzgg8".to_string(),
            discovery_source: "seed".to_string(),
            opted_out: false,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let id = Uuid::new_v4();
    let (mut artist, images) = jane(id);
    artist.home_studio_id = Some(studio_id);

    let outcome = store.put_artist(&artist, &images, "run-1").await.unwrap();
    assert_eq!(outcome, WriteOutcome::Applied { version: 1 });
}

#[tokio::test]
async fn mark_opted_out_clears_images_and_emits_remove_event() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (artist, images) = jane(id);
    store.put_artist(&artist, &images, "run-1").await.unwrap();

    store.mark_opted_out(id, "self-request").await.unwrap();

    let fetched = store.get_artist(id).await.unwrap().unwrap();
    assert!(fetched.artist.opted_out);
    assert!(fetched.images.is_empty());
}

#[tokio::test]
async fn list_artists_by_style_and_geo_finds_newly_ingested_artist() {
    let Some(store) = test_store().await else { return };
    let id = Uuid::new_v4();
    let (artist, images) = jane(id);
    store.put_artist(&artist, &images, "run-1").await.unwrap();

    let (found, _) = store
        .list_artists_by_style_and_geo("old_school", "9vfgzgg8", None, 20)
        .await
        .unwrap();
    assert!(found.iter().any(|a| a.artist.id == id));
}
