//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `Store` trait
//! defined in `cryptopay_core::storage`. The backend is selected at compile
//! time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store, nothing persisted
//! - `dynamodb`: AWS DynamoDB store using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p cryptopay --no-default-features --features dynamodb
//! ```

#[cfg(all(feature = "inmemory", feature = "dynamodb"))]
compile_error!(
    "Features 'inmemory' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p cryptopay --features dynamodb"
);

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

mod retry;

use std::sync::Arc;

use cryptopay_core::storage::Store;

use crate::config::Config;

#[cfg(any(feature = "inmemory", test))]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

pub use retry::RetryingStore;

/// Builds the store selected by the enabled feature.
#[cfg(feature = "inmemory")]
pub async fn build_store(_config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    tracing::info!(backend = "inmemory", "Using in-memory store");
    Ok(Arc::new(InMemoryStore::new()))
}

/// Builds the store selected by the enabled feature.
#[cfg(feature = "dynamodb")]
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    tracing::info!(backend = "dynamodb", table = %config.table_name, "Using DynamoDB store");
    Ok(Arc::new(DynamoDbStore::from_env(&config.table_name).await))
}
