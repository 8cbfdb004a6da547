//! Retry decorator for stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use cryptopay_core::storage::{
    Item, ItemKey, Page, PutCondition, Query, RepositoryError, Result, Store,
};

/// Wraps a store and retries transient failures with exponential backoff.
///
/// Reads retry every transient error. Writes retry only when the store
/// reported throttling, since a timed out or dropped conditional write may
/// already have been applied.
pub struct RetryingStore {
    inner: Arc<dyn Store>,
    max_attempts: usize,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryingStore {
    /// Default settings: 3 retries, 50ms first delay, 2s max delay.
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            max_attempts: 3,
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_max_times(self.max_attempts)
    }
}

fn should_retry_read(error: &RepositoryError) -> bool {
    error.is_transient()
}

fn should_retry_write(error: &RepositoryError) -> bool {
    matches!(error, RepositoryError::Throttled(_))
}

fn log_retry(error: &RepositoryError, delay: Duration) {
    tracing::warn!(error = %error, delay_ms = delay.as_millis() as u64, "Retrying store call");
}

#[async_trait]
impl Store for RetryingStore {
    async fn put_item(&self, item: &Item, condition: PutCondition) -> Result<()> {
        (|| async { self.inner.put_item(item, condition).await })
            .retry(self.backoff())
            .when(should_retry_write)
            .notify(log_retry)
            .await
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
        (|| async { self.inner.get_item(key).await })
            .retry(self.backoff())
            .when(should_retry_read)
            .notify(log_retry)
            .await
    }

    async fn query_page(&self, query: &Query, start_after: Option<&ItemKey>) -> Result<Page> {
        (|| async { self.inner.query_page(query, start_after).await })
            .retry(self.backoff())
            .when(should_retry_read)
            .notify(log_retry)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cryptopay_core::storage::EntityType;
    use serde_json::Map;

    use super::*;

    /// Fails the first `failures` calls with `error`, then succeeds.
    struct FlakyStore {
        calls: AtomicUsize,
        failures: usize,
        error: RepositoryError,
    }

    impl FlakyStore {
        fn new(failures: usize, error: RepositoryError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
                error,
            })
        }

        fn attempt(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn put_item(&self, _item: &Item, _condition: PutCondition) -> Result<()> {
            self.attempt()
        }

        async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
            self.attempt()?;
            Ok(Some(Item::new(key.clone(), Map::new())))
        }

        async fn query_page(&self, _query: &Query, _start_after: Option<&ItemKey>) -> Result<Page> {
            self.attempt()?;
            Ok(Page::default())
        }
    }

    fn retrying(inner: Arc<FlakyStore>) -> RetryingStore {
        RetryingStore::new(inner)
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_transient_read_errors_are_retried() {
        let inner = FlakyStore::new(2, RepositoryError::ConnectionFailed("reset".into()));
        let store = retrying(inner.clone());

        let item = store.get_item(&ItemKey::user("U1")).await.unwrap();

        assert!(item.is_some());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let inner = FlakyStore::new(10, RepositoryError::Timeout("slow".into()));
        let store = retrying(inner.clone()).with_max_attempts(2);

        let result = store
            .query_page(&Query::scan(EntityType::Payment), None)
            .await;

        assert_eq!(result, Err(RepositoryError::Timeout("slow".into())));
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let inner = FlakyStore::new(1, RepositoryError::QueryFailed("bad".into()));
        let store = retrying(inner.clone());

        let result = store.get_item(&ItemKey::user("U1")).await;

        assert!(result.is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_writes_retry_only_throttling() {
        let item = Item::new(ItemKey::user("U1"), Map::new());

        let throttled = FlakyStore::new(1, RepositoryError::Throttled("busy".into()));
        retrying(throttled.clone())
            .put_item(&item, PutCondition::KeyAbsent)
            .await
            .unwrap();
        assert_eq!(throttled.calls(), 2);

        let timed_out = FlakyStore::new(1, RepositoryError::Timeout("slow".into()));
        let result = retrying(timed_out.clone())
            .put_item(&item, PutCondition::KeyAbsent)
            .await;
        assert!(result.is_err());
        assert_eq!(timed_out.calls(), 1);
    }
}
