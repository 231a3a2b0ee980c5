//! Router-level tests against a real Postgres catalog/index/idempotency
//! store. Requires `DATABASE_TEST_URL`; skipped otherwise.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use core_api::{build_router, AppState, IdempotencyStore};
use core_catalog::{Artist, CatalogStore, PortfolioImage, TakedownStore};
use core_index::{ArtistDocument, IndexClient, PostgresIndexClient};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn test_env() -> Option<(Arc<AppState>, PgPool)> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    let catalog = CatalogStore::new(pool.clone());
    catalog.migrate().await.ok()?;
    let index = PostgresIndexClient::new(pool.clone());
    index.migrate().await.ok()?;
    let takedowns = TakedownStore::new(pool.clone());
    let idempotency = IdempotencyStore::new(pool.clone());
    idempotency.migrate().await.ok()?;

    sqlx::query(
        "TRUNCATE catalog_records, catalog_change_events, artist_search_index,
         takedown_requests, takedown_idempotency_keys",
    )
    .execute(&pool)
    .await
    .ok()?;

    let state = Arc::new(AppState::new(
        catalog,
        Arc::new(index),
        takedowns,
        idempotency,
        5,
        Duration::from_secs(60),
        Duration::from_secs(30),
    ));
    Some((state, pool))
}

#[tokio::test]
async fn get_artist_by_id_returns_404_when_absent() {
    let Some((state, _pool)) = test_env().await else { return };
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/artists/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_artists_rejects_malformed_style() {
    let Some((state, _pool)) = test_env().await else { return };
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/artists?style=old%20school!")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_artists_returns_indexed_documents() {
    let Some((state, _pool)) = test_env().await else { return };
    let artist_id = Uuid::new_v4();
    state
        .index
        .upsert(&ArtistDocument {
            artist_id,
            name: "Jane Doe".to_string(),
            styles: vec!["traditional".to_string()],
            geohash: "9vfgzgg8".to_string(),
            city: "Minneapolis".to_string(),
            search_terms: "jane doe traditional".to_string(),
            image_urls: vec![],
            version: 1,
        })
        .await
        .unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/artists?style=traditional")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["items"][0]["artistId"], artist_id.to_string());
}

#[tokio::test]
async fn takedown_requires_idempotency_key_header() {
    let Some((state, _pool)) = test_env().await else { return };
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/takedowns")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "artistId": Uuid::new_v4(),
                        "reason": "self-request",
                        "requesterEmail": "jane@example.com",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn takedown_replays_identical_payload_and_rejects_mismatch() {
    let Some((state, pool)) = test_env().await else { return };

    let studio_id = None;
    let artist_id = Uuid::new_v4();
    let catalog = CatalogStore::new(pool.clone());
    catalog
        .put_artist(
            &Artist {
                id: artist_id,
                name: "Jane Doe".to_string(),
                styles: vec!["traditional".to_string()],
                contact_handle: None,
                portfolio_url: None,
                home_studio_id: studio_id,
                geohash: "9vfgzgg8".to_string(),
                opted_out: false,
                last_scrape_at: None,
                last_successful_scrape_id: None,
                version: 0,
            },
            &[] as &[PortfolioImage],
            "run-1",
        )
        .await
        .unwrap();

    let app = build_router(state);

    let body = serde_json::json!({
        "artistId": artist_id,
        "reason": "self-request",
        "requesterEmail": "jane@example.com",
    })
    .to_string();

    let request = |body: String| {
        Request::builder()
            .method("POST")
            .uri("/v1/takedowns")
            .header("content-type", "application/json")
            .header("Idempotency-Key", "k-42")
            .body(Body::from(body))
            .unwrap()
    };

    let first = app.clone().oneshot(request(body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let replay = app.clone().oneshot(request(body.clone())).await.unwrap();
    assert_eq!(replay.status(), StatusCode::ACCEPTED);

    let mismatched_body = serde_json::json!({
        "artistId": artist_id,
        "reason": "different reason",
        "requesterEmail": "jane@example.com",
    })
    .to_string();
    let conflict = app.clone().oneshot(request(mismatched_body)).await.unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
}
