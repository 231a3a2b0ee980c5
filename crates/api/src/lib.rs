//! The Query API (C6): request validation, circuit-breaker-guarded index
//! reads, strong catalog reads, idempotent takedown writes.

mod app;
mod error;
mod idempotency;
mod postcode;
mod routes;
mod state;
mod validation;

pub use app::build_router;
pub use error::{ApiError, Result};
pub use idempotency::IdempotencyStore;
pub use state::AppState;
