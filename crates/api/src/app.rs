//! Router assembly, grounded on `rootsignal-web/src/main.rs`'s
//! `Router::new()...with_state(...).layer(...)` pattern.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::artists::{get_artist, list_artists};
use crate::routes::takedowns::create_takedown;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/artists", get(list_artists))
        .route("/v1/artists/{id}", get(get_artist))
        .route("/v1/takedowns", post(create_takedown))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
