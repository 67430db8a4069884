use log::warn;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    window_start: Instant,
}

impl Bucket {
    /// Starts a new full window once the current one has elapsed.
    fn refill(&mut self, capacity: u32, interval: Duration, now: Instant) {
        if now.duration_since(self.window_start) >= interval {
            self.tokens = capacity;
            self.window_start = now;
        }
    }
}

/// Token bucket refilled to `capacity` once per `interval`.
///
/// Shared by reference (`Arc<RateLimiter>`) between every client that talks
/// to the same provider account.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        RateLimiter {
            capacity,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                window_start: Instant::now(),
            }),
        }
    }

    pub fn per_minute(capacity: u32) -> Self {
        RateLimiter::new(capacity, DEFAULT_INTERVAL)
    }

    /// Takes one token, waiting for the next refill when the bucket is empty.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                bucket.refill(self.capacity, self.interval, now);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }
                (bucket.window_start + self.interval).saturating_duration_since(now)
            };
            warn!(
                "API-Football quota of {} requests used up, waiting {:?}",
                self.capacity, wait
            );
            sleep(wait).await;
        }
    }

    /// Drains the bucket and starts a new window, used when the provider says we are over quota.
    pub async fn exhaust(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.tokens = 0;
        bucket.window_start = Instant::now();
    }

    /// Tokens a caller could take right now without waiting.
    pub async fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.capacity, self.interval, Instant::now());
        bucket.tokens
    }
}
