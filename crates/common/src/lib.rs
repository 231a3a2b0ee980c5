//! Plumbing shared by every component of the ingestion core: structured
//! logging, typed errors, configuration, retry/backoff, correlation ids,
//! redaction, geospatial helpers, rate limiting, and the circuit breaker.

pub mod circuit_breaker;
pub mod config;
pub mod correlation;
pub mod error;
pub mod geo;
pub mod logging;
pub mod rate_limit;
pub mod redact;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::Config;
pub use correlation::{correlation_id_or_new, new_correlation_id};
pub use error::{CoreError, Result};
pub use rate_limit::HostRateLimiter;
pub use redact::Redactor;
pub use retry::RetryPolicy;
