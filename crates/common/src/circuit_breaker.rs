//! Circuit breaker guarding an unreliable dependency (§4.6, §9).
//!
//! A small lock-guarded state machine, not thread-local state, per the
//! design note: "use an atomic or lock-guarded struct". State transitions
//! only happen under the lock; reads of `state()` are cheap.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    window_start: Instant,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    window: Duration,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, window: Duration, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            window,
            cooldown,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                window_start: Instant::now(),
            }),
        }
    }

    /// Call before making the guarded call. Returns `Err(retry_after)` if
    /// the circuit is open and no probe should be admitted yet.
    pub fn check(&self) -> Result<(), Duration> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("Open state always has opened_at");
                if opened_at.elapsed() >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(self.cooldown - opened_at.elapsed())
                }
            }
            CircuitState::HalfOpen => Ok(()),
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.window_start = Instant::now();
        inner.opened_at = None;
    }

    /// Record a failed call. Trips the breaker after `failure_threshold`
    /// consecutive failures within `window`, or immediately on a failed
    /// half-open probe.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.consecutive_failures = self.failure_threshold;
            return;
        }

        if inner.window_start.elapsed() > self.window {
            inner.window_start = Instant::now();
            inner.consecutive_failures = 0;
        }

        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(5, Duration::from_secs(60), Duration::from_secs(30));
        for _ in 0..4 {
            assert!(cb.check().is_ok());
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.check().is_err());
    }

    #[test]
    fn half_open_probe_failure_reopens_immediately() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60), Duration::from_millis(1));
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cb.check().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_probe_success_closes_circuit() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60), Duration::from_millis(1));
        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(cb.check().is_ok());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn failures_outside_window_do_not_accumulate() {
        let cb = CircuitBreaker::new(2, Duration::from_millis(5), Duration::from_secs(30));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
