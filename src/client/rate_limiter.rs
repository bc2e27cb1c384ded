use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

/// Process-wide token bucket gating every outbound provider call.
///
/// Refill is lazy: each acquisition attempt credits `elapsed * rate` tokens
/// (capped at capacity) before testing availability. The read-modify-write
/// of the bucket state is a single critical section; a token is only ever
/// consumed on the success path inside that section, so a caller cancelled
/// while waiting never loses one.
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket holding `capacity` tokens (the burst size), refilled
    /// at `refill_rate` tokens per second. Starts full.
    #[must_use]
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        debug!(capacity, refill_rate, "created token bucket");
        Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available, then consume it.
    ///
    /// Callers are served in the order they reach the critical section; no
    /// stricter fairness is guaranteed. The wait loops rather than sleeping
    /// once, since a concurrent caller may take the token we slept for.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate)
            };

            debug!(wait_ms = wait.as_millis() as u64, "rate limiter: waiting for token");
            sleep(wait).await;
        }
    }

    /// Tokens currently available, after applying any pending refill.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    /// Burst size of this bucket.
    #[must_use]
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Refill rate in tokens per second.
    #[must_use]
    pub const fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn burst_capacity_is_granted_without_waiting() {
        let bucket = TokenBucket::new(5.0, 0.25);

        let start = Instant::now();
        for _ in 0..5 {
            bucket.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn exhausted_bucket_blocks_for_one_refill_interval() {
        // rate 10/s => the (capacity + 1)-th acquire should wait ~100ms
        let bucket = TokenBucket::new(2.0, 10.0);
        bucket.acquire().await;
        bucket.acquire().await;

        let start = Instant::now();
        bucket.acquire().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(70), "waited {waited:?}");
        assert!(waited < Duration::from_millis(300), "waited {waited:?}");
    }

    #[tokio::test]
    async fn tokens_never_exceed_capacity() {
        let bucket = TokenBucket::new(3.0, 1000.0);
        sleep(Duration::from_millis(50)).await;
        assert!(bucket.available().await <= 3.0);
    }

    #[tokio::test]
    async fn cancelled_acquire_does_not_consume_a_token() {
        let bucket = Arc::new(TokenBucket::new(1.0, 2.0));
        bucket.acquire().await;

        // Abort a waiter mid-wait; the bucket must stay consistent.
        let waiter = {
            let bucket = Arc::clone(&bucket);
            tokio::spawn(async move { bucket.acquire().await })
        };
        sleep(Duration::from_millis(50)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        // The next acquire still gets the token the refill produced.
        let start = Instant::now();
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(bucket.available().await >= 0.0);
    }

    #[tokio::test]
    async fn concurrent_contention_stays_within_budget() {
        let bucket = Arc::new(TokenBucket::new(2.0, 20.0));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let bucket = Arc::clone(&bucket);
            handles.push(tokio::spawn(async move { bucket.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 2 immediate + 2 waiting ~50ms each at 20/s.
        assert!(start.elapsed() >= Duration::from_millis(70));
    }
}
