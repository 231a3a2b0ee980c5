//! Problem-document error responses (§6, §7): the HTTP surface never
//! returns stack traces, only `{type, title, detail, correlationId}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("not found")]
    NotFound,

    #[error("idempotency key reused with a different payload")]
    IdempotencyConflict,

    #[error("index unavailable, retry after {retry_after_secs}s")]
    IndexUnavailable { retry_after_secs: u64 },

    #[error("catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error("index error: {0}")]
    Index(#[from] core_index::IndexError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ProblemDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    detail: String,
    #[serde(rename = "correlationId")]
    correlation_id: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::IdempotencyConflict => StatusCode::CONFLICT,
            ApiError::IndexUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Catalog(_) | ApiError::Index(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput { .. } => "invalid-input",
            ApiError::NotFound => "not-found",
            ApiError::IdempotencyConflict => "idempotency-conflict",
            ApiError::IndexUnavailable { .. } => "index-unavailable",
            ApiError::Catalog(_) | ApiError::Index(_) | ApiError::Database(_) => "internal",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::InvalidInput { .. } => "Invalid input",
            ApiError::NotFound => "Not found",
            ApiError::IdempotencyConflict => "Idempotency key conflict",
            ApiError::IndexUnavailable { .. } => "Index unavailable",
            ApiError::Catalog(_) | ApiError::Index(_) | ApiError::Database(_) => {
                "Internal server error"
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let correlation_id = core_common::new_correlation_id();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, correlation_id, "request failed");
        } else {
            tracing::warn!(error = %self, correlation_id, "request rejected");
        }

        let mut response = if let ApiError::IndexUnavailable { retry_after_secs } = self {
            Json(serde_json::json!({
                "type": "index-unavailable",
                "title": "Index unavailable",
                "detail": "the search index circuit breaker is open",
                "correlationId": correlation_id,
                "retryAfterSeconds": retry_after_secs,
            }))
            .into_response()
        } else {
            let detail = self.to_string();
            Json(ProblemDocument {
                kind: self.kind(),
                title: self.title(),
                detail,
                correlation_id,
            })
            .into_response()
        };

        *response.status_mut() = status;
        response
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
