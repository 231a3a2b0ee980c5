use std::sync::Arc;
use std::time::Duration;

use core_catalog::{CatalogStore, TakedownStore};
use core_common::CircuitBreaker;
use core_index::IndexClient;

use crate::idempotency::IdempotencyStore;

pub struct AppState {
    pub catalog: CatalogStore,
    pub index: Arc<dyn IndexClient>,
    pub takedowns: TakedownStore,
    pub idempotency: IdempotencyStore,
    /// Guards index queries (§4.6): `Open` short-circuits straight to a 503
    /// without contacting the index.
    pub index_breaker: Arc<CircuitBreaker>,
}

impl AppState {
    pub fn new(
        catalog: CatalogStore,
        index: Arc<dyn IndexClient>,
        takedowns: TakedownStore,
        idempotency: IdempotencyStore,
        breaker_failure_threshold: u32,
        breaker_window: Duration,
        breaker_cooldown: Duration,
    ) -> Self {
        Self {
            catalog,
            index,
            takedowns,
            idempotency,
            index_breaker: Arc::new(CircuitBreaker::new(
                breaker_failure_threshold,
                breaker_window,
                breaker_cooldown,
            )),
        }
    }
}
