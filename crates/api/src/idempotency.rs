//! Idempotency guard for `POST /v1/takedowns` (§4.6, §8 "Takedown"
//! scenario): a conditional write stores the key with a hash of the
//! request payload; duplicate arrivals replay the stored response,
//! mismatched payloads under the same key are rejected with 409.

use sqlx::PgPool;

use crate::error::ApiError;

#[derive(Clone)]
pub struct IdempotencyStore {
    pool: PgPool,
}

/// What to do with a request carrying a given `Idempotency-Key`.
pub enum Admission {
    /// First time this key has been seen — proceed and call `record`.
    Proceed,
    /// The key was already used with an identical payload — replay this
    /// previously stored response verbatim.
    Replay { status: u16, body: serde_json::Value },
}

impl IdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn admit(&self, key: &str, payload_hash: &str) -> Result<Admission, ApiError> {
        let existing: Option<(String, i16, serde_json::Value)> = sqlx::query_as(
            "SELECT payload_hash, response_status, response_body
             FROM takedown_idempotency_keys WHERE idempotency_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            None => Ok(Admission::Proceed),
            Some((stored_hash, status, body)) if stored_hash == payload_hash => {
                Ok(Admission::Replay { status: status as u16, body })
            }
            Some(_) => Err(ApiError::IdempotencyConflict),
        }
    }

    pub async fn record(
        &self,
        key: &str,
        payload_hash: &str,
        status: u16,
        body: &serde_json::Value,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO takedown_idempotency_keys (idempotency_key, payload_hash, response_status, response_body)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (idempotency_key) DO NOTHING",
        )
        .bind(key)
        .bind(payload_hash)
        .bind(status as i16)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Stable hash of the request payload used to detect a mismatched replay.
pub fn hash_payload(value: &serde_json::Value) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
