//! `POST /v1/takedowns` (§4.6, §6, §8 "Takedown" scenario).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::idempotency::{hash_payload, Admission};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TakedownRequestBody {
    #[serde(rename = "artistId")]
    artist_id: Uuid,
    reason: String,
    #[serde(rename = "requesterEmail")]
    requester_email: String,
}

pub async fn create_takedown(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TakedownRequestBody>,
) -> Result<Response> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidInput {
            field: "Idempotency-Key".to_string(),
            reason: "header is required".to_string(),
        })?;

    let payload_json = serde_json::json!({
        "artistId": body.artist_id,
        "reason": body.reason,
        "requesterEmail": body.requester_email,
    });
    let payload_hash = hash_payload(&payload_json);

    match state.idempotency.admit(&idempotency_key, &payload_hash).await? {
        Admission::Replay { status, body } => {
            let mut response = Json(body).into_response();
            *response.status_mut() =
                StatusCode::from_u16(status).unwrap_or(StatusCode::ACCEPTED);
            Ok(response)
        }
        Admission::Proceed => {
            let takedown_id = state
                .takedowns
                .create(body.artist_id, &body.requester_email, &body.reason)
                .await?;

            let response_body = serde_json::json!({
                "status": "accepted",
                "takedownId": takedown_id,
            });
            state
                .idempotency
                .record(&idempotency_key, &payload_hash, StatusCode::ACCEPTED.as_u16(), &response_body)
                .await?;

            // On-demand sweep trigger (§4.6, §9): don't make the caller wait
            // for the hourly background sweep to see their request applied.
            if let Err(e) = core_catalog::run_sweep(&state.takedowns, &state.catalog).await {
                tracing::warn!(error = %e, "on-demand takedown sweep failed");
            }

            let mut response = Json(response_body).into_response();
            *response.status_mut() = StatusCode::ACCEPTED;
            Ok(response)
        }
    }
}
