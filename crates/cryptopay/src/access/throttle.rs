use std::sync::Mutex;
use std::time::Instant;

use cryptopay_core::throttle::{Admission, ThrottleLimits, TokenBucket};

/// Service-wide token bucket shared by every request.
#[derive(Debug)]
pub struct SharedThrottle {
    bucket: Mutex<TokenBucket>,
}

impl SharedThrottle {
    pub fn new(limits: ThrottleLimits) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(limits, Instant::now())),
        }
    }

    pub fn try_acquire(&self) -> Admission {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> Admission {
        // The bucket is always left consistent, so a poisoned lock is still usable.
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.try_acquire(now)
    }
}
