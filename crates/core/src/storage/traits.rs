use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::{Stream, StreamExt};

use super::{EntityType, IndexName, Item, ItemKey, Result};

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Insert or overwrite unconditionally.
    Overwrite,
    /// Fail with `AlreadyExists` if `(pk, sk)` is taken.
    KeyAbsent,
    /// `KeyAbsent`, and additionally fail with `AlreadyExists` if any item
    /// already carries the same `paymentId`.
    UniquePaymentId,
}

/// Which key space a query walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Items sharing a partition key.
    Partition(String),
    /// Items sharing a secondary index hash key.
    Index { index: IndexName, key: String },
    /// Every item in the table.
    Scan,
}

/// A prefix query over one key space, ordered by `sk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub target: QueryTarget,
    pub sk_prefix: Option<EntityType>,
    pub descending: bool,
    pub page_size: Option<usize>,
}

impl Query {
    /// Items of one kind under a partition key.
    pub fn partition(pk: impl Into<String>, sk_prefix: EntityType) -> Self {
        Self {
            target: QueryTarget::Partition(pk.into()),
            sk_prefix: Some(sk_prefix),
            descending: false,
            page_size: None,
        }
    }

    /// Items reachable through a secondary index hash key.
    pub fn index(index: IndexName, key: impl Into<String>, sk_prefix: Option<EntityType>) -> Self {
        Self {
            target: QueryTarget::Index {
                index,
                key: key.into(),
            },
            sk_prefix,
            descending: false,
            page_size: None,
        }
    }

    /// Every item whose sort key starts with the entity prefix.
    pub fn scan(sk_prefix: EntityType) -> Self {
        Self {
            target: QueryTarget::Scan,
            sk_prefix: Some(sk_prefix),
            descending: false,
            page_size: None,
        }
    }

    /// Newest (highest `sk`) first.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Whether an item belongs to this query's result set.
    pub fn matches(&self, item: &Item) -> bool {
        let in_target = match &self.target {
            QueryTarget::Partition(pk) => item.pk() == *pk,
            QueryTarget::Index { index, key } => match index {
                IndexName::PaymentId => item.payment_id() == Some(key.as_str()),
            },
            QueryTarget::Scan => true,
        };

        in_target
            && self
                .sk_prefix
                .is_none_or(|prefix| item.entity_type() == prefix)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Item>,
    /// Key of the last evaluated item; `None` when the query is exhausted.
    pub last_key: Option<ItemKey>,
}

/// Durable key-value/document store addressed by `(pk, sk)`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or overwrites an item, subject to `condition`.
    async fn put_item(&self, item: &Item, condition: PutCondition) -> Result<()>;

    /// Gets an item by its primary key.
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>>;

    /// Fetches the page of `query` that follows `start_after`.
    async fn query_page(&self, query: &Query, start_after: Option<&ItemKey>) -> Result<Page>;
}

/// Lazy, finite, ordered sequence of query results.
pub type ItemStream<'a> = Pin<Box<dyn Stream<Item = Result<Item>> + Send + 'a>>;

/// Walks every page of `query`, fetching the next page only when the
/// previous one has been consumed.
pub fn query_items<'a>(store: &'a dyn Store, query: Query) -> ItemStream<'a> {
    Box::pin(async_stream::try_stream! {
        let mut cursor: Option<ItemKey> = None;
        loop {
            let page = store.query_page(&query, cursor.as_ref()).await?;
            for item in page.items {
                yield item;
            }
            match page.last_key {
                Some(key) => cursor = Some(key),
                None => break,
            }
        }
    })
}

/// Drains a stream into a vector, stopping at the first error.
pub async fn collect_items(stream: ItemStream<'_>) -> Result<Vec<Item>> {
    stream.collect::<Result<Vec<Item>>>().await
}
