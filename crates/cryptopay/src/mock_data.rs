//! Demo data for local runs.

use chrono::Utc;

use cryptopay_core::payment::{generate_seed_rates, rate_to_item, DEFAULT_PAIRS};
use cryptopay_core::storage::{PutCondition, Result, Store};

/// Observations per pair written by [`seed_demo_rates`].
pub const DEMO_RATE_POINTS: u32 = 30;

/// Writes a deterministic rate history ending now. Returns the number of
/// items written.
pub async fn seed_demo_rates(store: &dyn Store) -> Result<usize> {
    let rates = generate_seed_rates(&DEFAULT_PAIRS, DEMO_RATE_POINTS, Utc::now());

    for rate in &rates {
        store
            .put_item(&rate_to_item(rate)?, PutCondition::Overwrite)
            .await?;
    }

    tracing::info!(count = rates.len(), "Seeded demo rates");
    Ok(rates.len())
}
