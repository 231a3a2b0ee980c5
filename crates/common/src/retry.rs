//! Capped exponential backoff with full jitter and an overall time budget.

use std::time::{Duration, Instant};

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
    pub budget: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            max: Duration::from_secs(10),
            budget: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Full-jitter exponential backoff delay for the given attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.max);
        let jittered_millis = rand::rng().random_range(0..=capped.as_millis().max(1) as u64);
        Duration::from_millis(jittered_millis)
    }

    /// Run `f` until it succeeds, the attempt cap is hit, or the time
    /// budget is exhausted — whichever comes first.
    pub async fn retry<T, E, F, Fut>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let deadline = Instant::now() + self.budget;
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || Instant::now() >= deadline {
                        return Err(e);
                    }
                    tokio::time::sleep(self.delay_for(attempt)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_never_exceeds_max() {
        let policy = RetryPolicy {
            base: Duration::from_millis(50),
            max: Duration::from_millis(200),
            budget: Duration::from_secs(1),
            max_attempts: 10,
        };
        for attempt in 0..10 {
            assert!(policy.delay_for(attempt) <= policy.max);
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy {
            base: Duration::from_millis(1),
            max: Duration::from_millis(5),
            budget: Duration::from_secs(5),
            max_attempts: 10,
        };
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = policy
            .retry(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err("transient")
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn stops_at_max_attempts() {
        let policy = RetryPolicy {
            base: Duration::from_millis(1),
            max: Duration::from_millis(2),
            budget: Duration::from_secs(5),
            max_attempts: 3,
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = policy
            .retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("always fails")
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
