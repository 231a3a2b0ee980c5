//! `GET /v1/artists` and `GET /v1/artists/{id}` (§4.6, §6).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use core_index::SearchQuery;

use crate::error::{ApiError, Result};
use crate::postcode::validate_postcode;
use crate::state::AppState;
use crate::validation::{validate_geohash_prefix, validate_style};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistsQuery {
    style: Option<String>,
    city: Option<String>,
    postcode: Option<String>,
    #[allow(dead_code)]
    min_rating: Option<f32>,
    cursor: Option<Uuid>,
    limit: Option<i64>,
}

/// Paginated search against the derived index (§4.2, §4.6). `minRating`
/// is accepted for forward compatibility but has no effect — the index
/// does not currently carry a rating field (§9 Non-goals: "ranking beyond
/// field weights").
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ArtistsQuery>,
) -> Result<impl IntoResponse> {
    let style = params.style.as_deref().map(validate_style).transpose()?;

    let geohash_prefix = match &params.postcode {
        Some(postcode) => Some(validate_geohash_prefix("postcode", &validate_postcode(postcode)?)?),
        None => None,
    };

    let limit = params.limit.unwrap_or(20).clamp(1, 50);

    if let Err(retry_after) = state.index_breaker.check() {
        return Err(ApiError::IndexUnavailable { retry_after_secs: retry_after.as_secs().max(1) });
    }

    let query = SearchQuery {
        style,
        city: params.city.clone(),
        geohash_prefix,
        cursor: params.cursor,
        limit,
    };

    match state.index.search(query).await {
        Ok(results) => {
            state.index_breaker.record_success();
            Ok(Json(serde_json::json!({
                "items": results.items,
                "nextCursor": results.next_cursor,
            })))
        }
        Err(e) => {
            state.index_breaker.record_failure();
            Err(ApiError::from(e))
        }
    }
}

/// Strong read from the catalog, not the index (§4.6) — used when a client
/// needs the authoritative record rather than eventually-consistent search
/// results.
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    match state.catalog.get_artist(id).await? {
        Some(artist) => Ok(Json(serde_json::json!(artist))),
        None => Err(ApiError::NotFound),
    }
}
