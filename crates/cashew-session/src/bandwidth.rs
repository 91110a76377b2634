//! Outbound bandwidth throttling: a lazily-refilled token bucket.
//!
//! Per spec.md §5, the limiter's lock must be short and never held across
//! I/O: [`BandwidthLimiter::try_consume`] only does arithmetic under the
//! lock the caller holds, then releases before the actual send happens.

use std::sync::Mutex;

/// A token bucket refilled lazily: tokens accrue only when checked, based
/// on elapsed time since the last check, rather than on a timer tick.
pub struct BandwidthLimiter {
    inner: Mutex<Bucket>,
}

struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: u64,
}

impl BandwidthLimiter {
    /// `capacity_bytes` bounds the burst size; `refill_bytes_per_sec` is
    /// the sustained throughput the bucket replenishes at.
    pub fn new(capacity_bytes: u64, refill_bytes_per_sec: u64, now: u64) -> Self {
        Self {
            inner: Mutex::new(Bucket {
                capacity: capacity_bytes as f64,
                tokens: capacity_bytes as f64,
                refill_per_sec: refill_bytes_per_sec as f64,
                last_refill: now,
            }),
        }
    }

    fn refill(bucket: &mut Bucket, now: u64) {
        let elapsed = now.saturating_sub(bucket.last_refill) as f64;
        if elapsed > 0.0 {
            bucket.tokens = (bucket.tokens + elapsed * bucket.refill_per_sec).min(bucket.capacity);
            bucket.last_refill = now;
        }
    }

    /// Refill lazily to `now`, then attempt to withdraw `bytes`. Returns
    /// `true` and deducts the tokens on success; returns `false` and
    /// leaves the bucket untouched otherwise. Never blocks and never
    /// performs I/O.
    pub fn try_consume(&self, bytes: u64, now: u64) -> bool {
        let mut bucket = self.lock();
        Self::refill(&mut bucket, now);

        let requested = bytes as f64;
        if bucket.tokens >= requested {
            bucket.tokens -= requested;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, after a lazy refill to `now`.
    pub fn available(&self, now: u64) -> u64 {
        let mut bucket = self.lock();
        Self::refill(&mut bucket, now);
        bucket.tokens as u64
    }

    /// Lock the bucket, recovering the inner state rather than panicking
    /// if a prior holder panicked while holding it: the arithmetic this
    /// lock guards has no invariant that a panic mid-update could corrupt
    /// beyond what the next refill/consume call already tolerates.
    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_within_capacity_succeeds() {
        let limiter = BandwidthLimiter::new(1000, 100, 0);
        assert!(limiter.try_consume(500, 0));
        assert_eq!(limiter.available(0), 500);
    }

    #[test]
    fn test_consume_beyond_available_fails_and_leaves_bucket_untouched() {
        let limiter = BandwidthLimiter::new(1000, 100, 0);
        assert!(limiter.try_consume(900, 0));
        assert!(!limiter.try_consume(200, 0));
        assert_eq!(limiter.available(0), 100);
    }

    #[test]
    fn test_refill_is_lazy_and_time_proportional() {
        let limiter = BandwidthLimiter::new(1000, 100, 0);
        assert!(limiter.try_consume(1000, 0));
        assert_eq!(limiter.available(5), 500);
    }

    #[test]
    fn test_refill_never_exceeds_capacity() {
        let limiter = BandwidthLimiter::new(1000, 100, 0);
        assert_eq!(limiter.available(100), 1000);
    }
}
