use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// How many submissions a single sink may receive per rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window limiter keyed by sink address.
///
/// Only the submission gateway writes to it. Expired timestamps are trimmed
/// before every check.
#[derive(Debug, Default)]
pub struct RateLimiter {
    limit: RateLimit,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with the given limit.
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// The configured limit.
    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Record a request for `key` if the limit allows it.
    ///
    /// On refusal returns how long until the oldest request leaves the window.
    pub fn try_acquire(&self, key: &str) -> Result<(), Duration> {
        self.try_acquire_at(key, Instant::now())
    }

    /// Like [`try_acquire`](Self::try_acquire) with an explicit clock reading.
    pub fn try_acquire_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let window = self.limit.window;
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        // Forget sinks whose newest request has left the window.
        requests.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
        let timestamps = requests.entry(key.to_string()).or_default();

        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.limit.max_requests {
            let retry_after = timestamps
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            return Err(retry_after);
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// Number of sinks with requests still inside the window.
    pub fn tracked_sinks(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleventh_request_in_window_is_refused() {
        let limiter = RateLimiter::new(RateLimit::default());
        let start = Instant::now();
        for i in 0..10 {
            assert!(limiter.try_acquire_at("sink", start + Duration::from_secs(i)).is_ok());
        }
        let retry_after = limiter
            .try_acquire_at("sink", start + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(50));
    }

    #[test]
    fn window_rolls_over() {
        let limiter = RateLimiter::new(RateLimit {
            max_requests: 2,
            window: Duration::from_secs(60),
        });
        let start = Instant::now();
        assert!(limiter.try_acquire_at("sink", start).is_ok());
        assert!(limiter.try_acquire_at("sink", start + Duration::from_secs(30)).is_ok());
        assert!(limiter.try_acquire_at("sink", start + Duration::from_secs(59)).is_err());
        assert!(limiter.try_acquire_at("sink", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn sinks_are_limited_independently() {
        let limiter = RateLimiter::new(RateLimit {
            max_requests: 1,
            window: Duration::from_secs(60),
        });
        let now = Instant::now();
        assert!(limiter.try_acquire_at("a", now).is_ok());
        assert!(limiter.try_acquire_at("a", now).is_err());
        assert!(limiter.try_acquire_at("b", now).is_ok());
    }

    #[test]
    fn idle_sinks_are_forgotten() {
        let limiter = RateLimiter::new(RateLimit::default());
        let start = Instant::now();
        for sink in ["a", "b", "c"] {
            assert!(limiter.try_acquire_at(sink, start).is_ok());
        }
        assert_eq!(limiter.tracked_sinks(), 3);

        assert!(limiter.try_acquire_at("d", start + Duration::from_secs(60)).is_ok());
        assert_eq!(limiter.tracked_sinks(), 1);
    }
}
