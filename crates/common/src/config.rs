use std::env;
use std::time::Duration;

/// Configuration shared by every binary, loaded from environment variables.
///
/// Each binary calls the `*_from_env` constructor matching its role; fields
/// irrelevant to that role are left at their defaults rather than modeled
/// as `Option` everywhere, matching `rootsignal_common::Config`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    // Concurrency limits
    pub worker_concurrency: usize,
    pub orchestrator_fanout: usize,

    // Queue
    pub visibility_timeout_secs: u64,
    pub max_attempts: u32,

    // Projector
    pub projector_shard_count: i32,
    pub projector_poll_interval_secs: u64,

    // Rate limiting
    pub rate_limit_tokens_per_sec: f64,
    pub rate_limit_burst: u32,

    // HTTP
    pub fetch_timeout_secs: u64,
    pub max_redirects: usize,

    // Circuit breaker
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_window_secs: u64,
    pub circuit_breaker_cooldown_secs: u64,

    // API
    pub api_host: String,
    pub api_port: u16,

    // Correlation
    pub correlation_id_header: String,

    // Orchestrator scheduling
    pub orchestrator_run_interval_secs: u64,
    pub orchestrator_drain_timeout_secs: u64,
    pub seed_studios_path: Option<String>,
}

impl Config {
    /// Load config for the scrape worker pool.
    pub fn worker_from_env() -> Self {
        Self::base_from_env()
    }

    /// Load config for the orchestrator.
    pub fn orchestrator_from_env() -> Self {
        Self::base_from_env()
    }

    /// Load config for the change-stream projector.
    pub fn projector_from_env() -> Self {
        Self::base_from_env()
    }

    /// Load config for the query API.
    pub fn api_from_env() -> Self {
        Self::base_from_env()
    }

    fn base_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            worker_concurrency: env_parse_or("WORKER_CONCURRENCY", 8),
            orchestrator_fanout: env_parse_or("ORCHESTRATOR_FANOUT", 10),
            visibility_timeout_secs: env_parse_or("VISIBILITY_TIMEOUT_SECS", 60),
            max_attempts: env_parse_or("MAX_ATTEMPTS", 5),
            projector_shard_count: env_parse_or("PROJECTOR_SHARD_COUNT", 4),
            projector_poll_interval_secs: env_parse_or("PROJECTOR_POLL_INTERVAL_SECS", 2),
            rate_limit_tokens_per_sec: env_parse_or("RATE_LIMIT_TOKENS_PER_SEC", 1.0),
            rate_limit_burst: env_parse_or("RATE_LIMIT_BURST", 3),
            fetch_timeout_secs: env_parse_or("FETCH_TIMEOUT_SECS", 30),
            max_redirects: env_parse_or("MAX_REDIRECTS", 5),
            circuit_breaker_failure_threshold: env_parse_or("CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5),
            circuit_breaker_window_secs: env_parse_or("CIRCUIT_BREAKER_WINDOW_SECS", 60),
            circuit_breaker_cooldown_secs: env_parse_or("CIRCUIT_BREAKER_COOLDOWN_SECS", 30),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env_parse_or("API_PORT", 8080),
            correlation_id_header: env::var("CORRELATION_ID_HEADER")
                .unwrap_or_else(|_| "x-correlation-id".to_string()),
            orchestrator_run_interval_secs: env_parse_or("ORCHESTRATOR_RUN_INTERVAL_SECS", 3600),
            orchestrator_drain_timeout_secs: env_parse_or("ORCHESTRATOR_DRAIN_TIMEOUT_SECS", 3600),
            seed_studios_path: env::var("SEED_STUDIOS_PATH").ok(),
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn projector_poll_interval(&self) -> Duration {
        Duration::from_secs(self.projector_poll_interval_secs)
    }

    pub fn orchestrator_run_interval(&self) -> Duration {
        Duration::from_secs(self.orchestrator_run_interval_secs)
    }

    pub fn orchestrator_drain_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator_drain_timeout_secs)
    }

    /// Log presence and length of sensitive configuration rather than the
    /// values themselves.
    pub fn log_redacted(&self) {
        tracing::info!(
            database_url_len = self.database_url.len(),
            worker_concurrency = self.worker_concurrency,
            orchestrator_fanout = self.orchestrator_fanout,
            "configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
