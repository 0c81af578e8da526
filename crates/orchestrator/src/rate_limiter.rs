//! Token bucket shared by all workers

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    capacity: f64,
    refill_rate: f64,
}

impl RateLimiter {
    /// `requests_per_second` is also the burst size. Zero is treated as one.
    pub fn new(requests_per_second: u64) -> Self {
        let rate = requests_per_second.max(1) as f64;
        Self {
            bucket: Mutex::new(Bucket {
                tokens: rate,
                last_refill: Instant::now(),
            }),
            capacity: rate,
            refill_rate: rate,
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                let available = (bucket.tokens + elapsed * self.refill_rate).min(self.capacity);
                bucket.last_refill = now;
                if available >= 1.0 {
                    bucket.tokens = available - 1.0;
                    return;
                }
                bucket.tokens = available;
                Duration::from_secs_f64((1.0 - available) / self.refill_rate)
            };
            tokio::time::sleep(wait_time).await;
        }
    }

    pub fn rate(&self) -> f64 {
        self.refill_rate
    }
}
