//! Token bucket admission control.
//!
//! Tokens are counted in thousandths. Elapsed time that has not yet paid for
//! a whole millitoken is carried over to the next refill, so dense traffic
//! still earns the full rate. Time is always passed in; nothing here reads a
//! clock.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

const MILLI: u64 = 1_000;
const NANOS_PER_MILLITOKEN_AT_1RPS: u128 = 1_000_000;

/// Sustained rate and burst capacity of a usage plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleLimits {
    /// Tokens added per second.
    pub rate_per_sec: u64,
    /// Bucket capacity.
    pub burst: u64,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        Self {
            rate_per_sec: 100,
            burst: 200,
        }
    }
}

/// Outcome of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u64 },
    Throttled { retry_after_ms: u64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Millitokens accrued over `elapsed` at `rate_per_sec`.
pub fn refill_millitokens(elapsed: Duration, rate_per_sec: u64) -> u64 {
    let accrued = elapsed.as_nanos().saturating_mul(rate_per_sec as u128)
        / NANOS_PER_MILLITOKEN_AT_1RPS;
    u64::try_from(accrued).unwrap_or(u64::MAX)
}

/// Shortest interval that accrues `millitokens` at `rate_per_sec`.
pub fn accrual_time(millitokens: u64, rate_per_sec: u64) -> Duration {
    if rate_per_sec == 0 {
        return Duration::ZERO;
    }
    let nanos = (millitokens as u128 * NANOS_PER_MILLITOKEN_AT_1RPS).div_ceil(rate_per_sec as u128);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Milliseconds until `deficit` millitokens have been refilled.
pub fn retry_after_ms(deficit: u64, rate_per_sec: u64) -> u64 {
    if rate_per_sec == 0 {
        return u64::MAX;
    }
    deficit.div_ceil(rate_per_sec)
}

/// A token bucket that starts full.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    limits: ThrottleLimits,
    millitokens: u64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(limits: ThrottleLimits, now: Instant) -> Self {
        Self {
            limits,
            millitokens: limits.burst.saturating_mul(MILLI),
            last_refill: now,
        }
    }

    pub fn limits(&self) -> ThrottleLimits {
        self.limits
    }

    /// Whole tokens available at `now`.
    pub fn available(&mut self, now: Instant) -> u64 {
        self.refill(now);
        self.millitokens / MILLI
    }

    /// Takes one token if available.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        self.refill(now);

        if self.millitokens >= MILLI {
            self.millitokens -= MILLI;
            Admission::Admitted {
                remaining: self.millitokens / MILLI,
            }
        } else {
            Admission::Throttled {
                retry_after_ms: retry_after_ms(MILLI - self.millitokens, self.limits.rate_per_sec),
            }
        }
    }

    fn refill(&mut self, now: Instant) {
        // A clock that went backwards leaves the reference point alone.
        if now <= self.last_refill {
            return;
        }
        let elapsed = now - self.last_refill;
        let capacity = self.limits.burst.saturating_mul(MILLI);
        let accrued = refill_millitokens(elapsed, self.limits.rate_per_sec);
        let total = self.millitokens.saturating_add(accrued);

        if total >= capacity {
            self.millitokens = capacity;
            self.last_refill = now;
        } else {
            // Only the time that paid for `accrued` is consumed; the remainder
            // counts toward the next refill.
            self.millitokens = total;
            self.last_refill += accrual_time(accrued, self.limits.rate_per_sec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(bucket: &mut TokenBucket, now: Instant) -> u64 {
        let mut admitted = 0;
        while bucket.try_acquire(now).is_admitted() {
            admitted += 1;
        }
        admitted
    }

    #[test]
    fn test_default_limits() {
        let limits = ThrottleLimits::default();
        assert_eq!(limits.rate_per_sec, 100);
        assert_eq!(limits.burst, 200);
    }

    #[test]
    fn test_burst_is_admitted_at_once() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);

        assert_eq!(drain(&mut bucket, t0), 200);
    }

    #[test]
    fn test_101st_request_in_one_second_is_throttled() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        let t1 = t0 + Duration::from_secs(1);
        for _ in 0..100 {
            assert!(bucket.try_acquire(t1).is_admitted());
        }
        assert_eq!(
            bucket.try_acquire(t1),
            Admission::Throttled { retry_after_ms: 10 }
        );
    }

    #[test]
    fn test_steady_rate_is_sustained() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        // One request every 10ms matches 100 rps exactly.
        for i in 1..=500u64 {
            let now = t0 + Duration::from_millis(i * 10);
            assert!(bucket.try_acquire(now).is_admitted(), "request {i}");
        }
    }

    #[test]
    fn test_dense_arrivals_still_earn_full_rate() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        // One attempt every 5us for one second; each gap alone earns less
        // than a millitoken.
        let admitted = (1..=200_000u64)
            .filter(|i| {
                bucket
                    .try_acquire(t0 + Duration::from_micros(5 * i))
                    .is_admitted()
            })
            .count();

        assert_eq!(admitted, 100);
    }

    #[test]
    fn test_uneven_gaps_lose_no_time() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        // 15us gaps pay for one millitoken each and leave 5us behind.
        let mut now = t0;
        let mut admitted = 0;
        while now < t0 + Duration::from_secs(1) {
            now += Duration::from_micros(15);
            if bucket.try_acquire(now).is_admitted() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 100);
    }

    #[test]
    fn test_refill_is_capped_at_burst() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        assert_eq!(bucket.available(t0 + Duration::from_secs(3600)), 200);
    }

    #[test]
    fn test_clock_going_backwards_does_not_refill() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let mut bucket = TokenBucket::new(ThrottleLimits::default(), t0);
        drain(&mut bucket, t0);

        assert_eq!(bucket.available(t0 - Duration::from_secs(5)), 0);
    }

    #[test]
    fn test_pure_helpers() {
        assert_eq!(refill_millitokens(Duration::from_millis(10), 100), 1_000);
        assert_eq!(refill_millitokens(Duration::from_micros(1), 100), 0);
        assert_eq!(refill_millitokens(Duration::from_micros(15), 100), 1);
        assert_eq!(accrual_time(1, 100), Duration::from_micros(10));
        assert_eq!(accrual_time(1, 3), Duration::from_nanos(333_334));
        assert_eq!(accrual_time(5, 0), Duration::ZERO);
        assert_eq!(retry_after_ms(1_000, 100), 10);
        assert_eq!(retry_after_ms(1, 100), 1);
        assert_eq!(retry_after_ms(1, 0), u64::MAX);
    }
}
