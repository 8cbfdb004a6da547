use std::{env, time::Duration};

use cryptopay_core::storage::schema::DEFAULT_TABLE_NAME;
use cryptopay_core::throttle::ThrottleLimits;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Logical name of the store (default: "CryptoPaymentTable")
    pub table_name: String,
    /// Issued API keys (default: none)
    pub api_keys: Vec<String>,
    /// Shared rate/burst budget (default: 100 rps, 200 burst)
    pub throttle: ThrottleLimits,
    /// Retries for transient store failures (default: 3)
    pub store_retry_max_attempts: usize,
    /// First backoff delay in milliseconds (default: 50)
    pub store_retry_min_delay_ms: u64,
    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MAIN_TABLE` - Store name (default: "CryptoPaymentTable")
    /// - `API_KEYS` - Comma-separated issued keys (default: empty)
    /// - `THROTTLE_RATE_LIMIT` - Sustained requests per second (default: 100)
    /// - `THROTTLE_BURST_LIMIT` - Burst capacity (default: 200)
    /// - `STORE_RETRY_MAX_ATTEMPTS` - Transient store retries (default: 3)
    /// - `STORE_RETRY_MIN_DELAY_MS` - First backoff delay (default: 50)
    /// - `REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let defaults = ThrottleLimits::default();

        Self {
            table_name: lookup("MAIN_TABLE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            api_keys: lookup("API_KEYS")
                .map(|v| parse_api_keys(&v))
                .unwrap_or_default(),
            throttle: ThrottleLimits {
                rate_per_sec: nonzero(
                    "THROTTLE_RATE_LIMIT",
                    parsed("THROTTLE_RATE_LIMIT", defaults.rate_per_sec),
                    defaults.rate_per_sec,
                ),
                burst: nonzero(
                    "THROTTLE_BURST_LIMIT",
                    parsed("THROTTLE_BURST_LIMIT", defaults.burst),
                    defaults.burst,
                ),
            },
            store_retry_max_attempts: parsed("STORE_RETRY_MAX_ATTEMPTS", 3) as usize,
            store_retry_min_delay_ms: parsed("STORE_RETRY_MIN_DELAY_MS", 50),
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 10),
        }
    }

    pub fn store_retry_min_delay(&self) -> Duration {
        Duration::from_millis(self.store_retry_min_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// A zero throttle limit would refuse every request forever.
fn nonzero(name: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        tracing::warn!(name, default, "Throttle limit must be positive, using default");
        return default;
    }
    value
}

/// Splits a comma-separated key list, dropping blanks.
fn parse_api_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
