//! Per-provider rate limiter.
//!
//! Each provider gets its own limiter enforcing a minimum spacing of
//! `60 / requests_per_minute` seconds between granted calls. Callers wait;
//! nothing is queued or rejected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Minimum-interval rate limiter for a single provider.
#[derive(Debug)]
pub struct RateLimiter {
    /// Label for log lines
    name: String,
    /// Minimum spacing between two grants
    min_interval: Duration,
    /// Timestamp of the last grant; held across the wait so concurrent
    /// callers are spaced as well
    last_call: Mutex<Option<Instant>>,
    // Stats
    total_requests: AtomicU64,
    total_wait_ms: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with an explicit minimum interval.
    pub fn new(name: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            name: name.into(),
            min_interval,
            last_call: Mutex::new(None),
            total_requests: AtomicU64::new(0),
            total_wait_ms: AtomicU64::new(0),
        }
    }

    /// Create a limiter from a requests-per-minute quota.
    ///
    /// A quota of 0 disables spacing.
    pub fn per_minute(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let min_interval = if requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(60.0 / requests_per_minute as f64)
        };
        Self::new(name, min_interval)
    }

    /// Minimum spacing between grants.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the minimum interval since the last grant has elapsed,
    /// then record a new grant.
    ///
    /// Returns the duration waited.
    pub async fn acquire(&self) -> Duration {
        let mut last_call = self.last_call.lock().await;

        let wait_time = last_call
            .map(|last| self.min_interval.saturating_sub(last.elapsed()))
            .unwrap_or(Duration::ZERO);

        if wait_time > Duration::ZERO {
            debug!(
                limiter = %self.name,
                wait_ms = wait_time.as_millis() as u64,
                "Waiting for rate limit"
            );
            self.total_wait_ms
                .fetch_add(wait_time.as_millis() as u64, Ordering::Relaxed);
            tokio::time::sleep(wait_time).await;
        }

        *last_call = Some(Instant::now());
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        wait_time
    }

    /// Get statistics.
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_wait_secs: self.total_wait_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            min_interval_secs: self.min_interval.as_secs_f64(),
        }
    }
}

/// Rate limiter statistics.
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub total_requests: u64,
    pub total_wait_secs: f64,
    pub min_interval_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_interval_from_quota() {
        let openai = RateLimiter::per_minute("openai", 500).min_interval();
        assert!((openai.as_secs_f64() - 0.12).abs() < 1e-6);
        let cohere = RateLimiter::per_minute("cohere", 50).min_interval();
        assert!((cohere.as_secs_f64() - 1.2).abs() < 1e-6);
        assert_eq!(RateLimiter::per_minute("off", 0).min_interval(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::per_minute("test", 1);
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_consecutive_acquires_are_spaced() {
        // 600 rpm = 100ms spacing
        let limiter = RateLimiter::per_minute("test", 600);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
        let stats = limiter.stats();
        assert_eq!(stats.total_requests, 2);
        assert!(stats.total_wait_secs > 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(RateLimiter::new("test", Duration::from_millis(50)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 4 grants need at least 3 full intervals
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(limiter.stats().total_requests, 4);
    }

    #[tokio::test]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new("test", Duration::from_millis(20));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }
}
