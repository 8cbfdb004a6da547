//! Application state shared by every request handler.
//!
//! The raw store is private: handlers reach it only through
//! [`AppState::store_for`], which hands out a handle whose capability is the
//! static binding of the operation being served.

use std::sync::Arc;

use cryptopay_core::api::Operation;
use cryptopay_core::storage::{Store, StoreHandle};

use crate::access::{ApiKeyRegistry, SharedThrottle};
use crate::config::Config;
use crate::storage::RetryingStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Backing store, wrapped in the retry decorator.
    store: Arc<dyn Store>,
    /// Issued API keys.
    pub api_keys: Arc<ApiKeyRegistry>,
    /// Service-wide throttle budget.
    pub throttle: Arc<SharedThrottle>,
}

impl AppState {
    /// Creates the state around `store`, retrying transient failures as
    /// configured.
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let store = RetryingStore::new(store)
            .with_max_attempts(config.store_retry_max_attempts)
            .with_min_delay(config.store_retry_min_delay());

        let api_keys = ApiKeyRegistry::new(config.api_keys.iter().cloned());
        if api_keys.is_empty() {
            tracing::warn!("No API keys configured, every request will be rejected");
        } else {
            tracing::debug!(count = api_keys.len(), "Loaded API keys");
        }

        Self {
            store: Arc::new(store),
            api_keys: Arc::new(api_keys),
            throttle: Arc::new(SharedThrottle::new(config.throttle)),
        }
    }

    /// Store handle bound to the capability of `operation`.
    pub fn store_for(&self, operation: Operation) -> StoreHandle {
        StoreHandle::new(self.store.clone(), operation.capability(), operation.name())
    }
}

#[cfg(test)]
mod tests {
    use cryptopay_core::storage::{Capability, Item, ItemKey, PutCondition, RepositoryError};
    use serde_json::Map;

    use super::*;
    use crate::storage::InMemoryStore;

    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryStore::new()), &Config::default())
    }

    #[test]
    fn test_bindings_follow_operation() {
        let state = state();
        for operation in Operation::ALL {
            let handle = state.store_for(operation);
            assert_eq!(handle.capability(), operation.capability());
            assert_eq!(handle.holder(), operation.name());
        }
        assert_eq!(
            state.store_for(Operation::CreatePayment).capability(),
            Capability::ReadWrite
        );
    }

    #[tokio::test]
    async fn test_read_only_binding_cannot_write() {
        let state = state();
        let item = Item::new(ItemKey::user("U1"), Map::new());

        let result = state
            .store_for(Operation::GetUser)
            .put_item(&item, PutCondition::KeyAbsent)
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::CapabilityDenied { holder: "GetUser" })
        );
        let stored = state
            .store_for(Operation::GetUser)
            .get_item(&ItemKey::user("U1"))
            .await
            .unwrap();
        assert!(stored.is_none());
    }
}
