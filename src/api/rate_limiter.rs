//! Request spacing
//!
//! Keeps at least a minimum interval between consecutive outbound requests.
//! One slot, no burst: this is not a token bucket.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Latest dispatch time, reserved or recorded
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserves the next dispatch slot and sleeps until it arrives.
    ///
    /// Slots are handed out under the lock, so concurrent callers are spaced
    /// at least `min_interval` apart. Suspends the calling task only.
    pub async fn wait_if_needed(&self) {
        let slot = {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();
            let slot = match *last {
                Some(at) => (at + self.min_interval).max(now),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        let remaining = slot.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            debug!("Rate limiting: sleeping for {:.3}s", remaining.as_secs_f64());
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Records "now" as a dispatch time, keeping any later reservation.
    pub async fn mark_request(&self) {
        let now = Instant::now();
        let mut last = self.last_request.lock().await;
        *last = Some(last.map_or(now, |at| at.max(now)));
    }

    /// Forgets the last dispatch time.
    pub async fn reset(&self) {
        *self.last_request.lock().await = None;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();

        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_remaining_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.mark_request().await;
        tokio::time::advance(Duration::from_millis(200)).await;

        let start = Instant::now();
        limiter.wait_if_needed().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300), "waited {waited:?}");
        assert!(waited < Duration::from_millis(400), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_pending_until_interval_passes() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.mark_request().await;

        let mut wait = tokio_test::task::spawn(limiter.wait_if_needed());
        tokio_test::assert_pending!(wait.poll());

        tokio::time::advance(Duration::from_millis(500)).await;
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_are_spaced() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
        limiter.mark_request().await;
        let start = Instant::now();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait_if_needed().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut released = Vec::new();
        for waiter in waiters {
            released.push(waiter.await.unwrap());
        }
        released.sort();

        assert!(released[0] >= Duration::from_millis(500), "{released:?}");
        for pair in released.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500), "{released:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_request_keeps_later_reservation() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
        limiter.mark_request().await;
        let start = Instant::now();

        // Reserves the slot at +500ms and sleeps on it.
        let pending = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.wait_if_needed().await })
        };
        tokio::task::yield_now().await;

        limiter.mark_request().await;
        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));

        pending.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.mark_request().await;
        tokio::time::advance(Duration::from_millis(150)).await;

        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_last_request() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.min_interval(), Duration::from_millis(100));
        limiter.mark_request().await;
        limiter.reset().await;

        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
