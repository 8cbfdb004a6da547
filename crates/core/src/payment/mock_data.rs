//! Mock rate generation for seeding.
//!
//! Pure and deterministic: the same inputs always produce the same series,
//! so seeded stores and tests agree on the values.

use chrono::{DateTime, Duration, Utc};

use super::Rate;

/// Pairs seeded when none are given.
pub const DEFAULT_PAIRS: [&str; 4] = ["BTC-USD", "ETH-USD", "SOL-USD", "BTC-EUR"];

fn base_price(pair: &str) -> f64 {
    match pair {
        "BTC-USD" => 64_000.0,
        "BTC-EUR" => 59_000.0,
        "ETH-USD" => 3_400.0,
        "SOL-USD" => 145.0,
        _ => 100.0,
    }
}

/// Small bounded wobble around the base price, in tenths of a percent.
fn wobble(step: u32, pair: &str) -> f64 {
    ((u64::from(step) * 7 + pair.len() as u64) % 13) as f64 - 6.0
}

/// Generates `points` observations per pair, one minute apart, the newest
/// stamped `end`.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use cryptopay_core::payment::generate_seed_rates;
///
/// let rates = generate_seed_rates(&["BTC-USD", "ETH-USD"], 3, Utc::now());
/// assert_eq!(rates.len(), 6);
/// ```
pub fn generate_seed_rates(pairs: &[&str], points: u32, end: DateTime<Utc>) -> Vec<Rate> {
    let mut rates = Vec::with_capacity(pairs.len() * points as usize);

    for pair in pairs {
        let base = base_price(pair);
        for step in 0..points {
            let price = base * (1.0 + wobble(step, pair) / 1_000.0);
            let timestamp = end - Duration::minutes(step as i64);
            rates.push(Rate::new(*pair, format!("{price:.2}"), timestamp));
        }
    }

    rates
}
