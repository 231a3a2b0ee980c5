//! Integration tests for the projector's apply path. Requires Postgres via
//! `DATABASE_TEST_URL`; skipped otherwise.

use std::sync::Arc;
use std::time::Duration;

use core_catalog::{Artist, ArtistWithImages, CatalogStore, ChangeEvent, ChangeEventType, PortfolioImage, RecordKey};
use core_index::{IndexClient, PostgresIndexClient};
use core_projector::{apply_event, Projector, ProjectorMetrics};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_env() -> Option<(PgPool, CatalogStore, Arc<PostgresIndexClient>)> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await.ok()?;
    let index = Arc::new(PostgresIndexClient::new(pool.clone()));
    index.migrate().await.ok()?;

    sqlx::query("TRUNCATE catalog_records, catalog_change_events, artist_search_index, projector_cursors, projector_dead_letters")
        .execute(&pool)
        .await
        .ok()?;

    Some((pool, catalog, index))
}

fn artist(id: Uuid, geohash: &str) -> Artist {
    Artist {
        id,
        name: "Jane Doe".to_string(),
        styles: vec!["old_school".to_string()],
        contact_handle: None,
        portfolio_url: None,
        home_studio_id: None,
        geohash: geohash.to_string(),
        opted_out: false,
        last_scrape_at: None,
        last_successful_scrape_id: None,
        version: 0,
    }
}

#[tokio::test]
async fn put_artist_is_eventually_reflected_in_the_index() {
    let Some((pool, catalog, index)) = test_env().await else { return };
    let id = Uuid::new_v4();

    catalog
        .put_artist(&artist(id, "9vfgzgg8"), &[], "run-1")
        .await
        .unwrap();

    let projector = Projector::new(pool.clone(), catalog.clone(), index.clone(), 4)
        .with_poll_interval(Duration::from_millis(50));
    let handle = tokio::spawn(async move { projector.run().await });

    let mut found = None;
    for _ in 0..50 {
        if let Some(doc) = index.get(id).await.unwrap() {
            found = Some(doc);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.abort();

    let doc = found.expect("artist should have been projected into the search index");
    assert_eq!(doc.name, "Jane Doe");
    assert!(doc.styles.contains(&"old_school".to_string()));
}

#[tokio::test]
async fn opt_out_removes_the_index_document() {
    let Some((pool, catalog, index)) = test_env().await else { return };
    let id = Uuid::new_v4();

    let images = vec![PortfolioImage {
        id: Uuid::new_v4(),
        artist_id: id,
        source_url: "https://example.com/a.jpg".to_string(),
        thumbnail_url: None,
        style_tags: vec![],
        width: None,
        height: None,
        ingested_at: chrono::Utc::now(),
    }];
    catalog.put_artist(&artist(id, "9vfgzgg8"), &images, "run-1").await.unwrap();
    catalog.mark_opted_out(id, "requested").await.unwrap();

    let projector = Projector::new(pool.clone(), catalog.clone(), index.clone(), 4)
        .with_poll_interval(Duration::from_millis(50));
    let handle = tokio::spawn(async move { projector.run().await });

    let mut gone = false;
    for _ in 0..50 {
        if index.get(id).await.unwrap().is_none() {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.abort();

    assert!(gone, "opted-out artist should be removed from the search index");
}

#[tokio::test]
async fn out_of_order_delivery_is_dropped_and_counted_as_stale() {
    let Some((_pool, catalog, index)) = test_env().await else { return };
    let id = Uuid::new_v4();
    let metrics = ProjectorMetrics::new();

    let key = RecordKey { pk: format!("ARTIST#{id}"), sk: "METADATA".to_string() };
    let new_image =
        serde_json::to_value(ArtistWithImages { artist: artist(id, "9vfgzgg8"), images: vec![] }).unwrap();

    let v3 = ChangeEvent {
        seq: 1,
        event_type: ChangeEventType::Insert,
        key: key.clone(),
        version: 3,
        new_image: Some(new_image.clone()),
    };
    apply_event(&v3, &catalog, index.as_ref(), &metrics).await.unwrap();

    let v2 = ChangeEvent {
        seq: 2,
        event_type: ChangeEventType::Modify,
        key,
        version: 2,
        new_image: Some(new_image),
    };
    apply_event(&v2, &catalog, index.as_ref(), &metrics).await.unwrap();

    let doc = index.get(id).await.unwrap().expect("document should exist");
    assert_eq!(doc.version, 3);
    assert_eq!(metrics.stale_upserts(), 1);
}
