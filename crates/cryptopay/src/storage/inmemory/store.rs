//! In-memory store implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cryptopay_core::storage::{
    Item, ItemKey, Page, PutCondition, Query, QueryTarget, RepositoryError, Result, Store,
};

/// Page size used when a query does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

type Key = (String, String);

#[derive(Debug, Default)]
struct Tables {
    /// `(pk, sk)` -> item
    items: BTreeMap<Key, Item>,
    /// `(paymentId, sk)` -> `(pk, sk)`, maintained with every write.
    payment_index: BTreeMap<Key, Key>,
}

impl Tables {
    fn payment_id_taken(&self, payment_id: &str) -> bool {
        self.payment_index
            .range((payment_id.to_string(), String::new())..)
            .next()
            .is_some_and(|((id, _), _)| id == payment_id)
    }
}

/// In-memory storage backend.
///
/// Items and the payment id index live behind one `tokio::sync::RwLock`, so
/// conditional writes and index maintenance are atomic. Data is lost when
/// the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    page_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.tables.read().await.items.len()
    }
}

/// Position of a key in the walk order of a query target.
///
/// Partitions and the index are walked by `sk`; a scan walks the whole
/// table by `(pk, sk)`.
fn walk_position(target: &QueryTarget, pk: String, sk: String) -> Key {
    match target {
        QueryTarget::Partition(_) | QueryTarget::Index { .. } => (sk, pk),
        QueryTarget::Scan => (pk, sk),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_item(&self, item: &Item, condition: PutCondition) -> Result<()> {
        let key = (item.pk(), item.sk());
        let mut tables = self.tables.write().await;

        let already_exists = |id: String| RepositoryError::AlreadyExists {
            entity_type: item.entity_type().label(),
            id,
        };

        match condition {
            PutCondition::Overwrite => {}
            PutCondition::KeyAbsent => {
                if tables.items.contains_key(&key) {
                    return Err(already_exists(key.0));
                }
            }
            PutCondition::UniquePaymentId => {
                if tables.items.contains_key(&key) {
                    return Err(already_exists(
                        item.payment_id().unwrap_or(key.0.as_str()).to_string(),
                    ));
                }
                if let Some(payment_id) = item.payment_id() {
                    if tables.payment_id_taken(payment_id) {
                        return Err(already_exists(payment_id.to_string()));
                    }
                }
            }
        }

        if let Some(payment_id) = item.payment_id() {
            tables
                .payment_index
                .insert((payment_id.to_string(), key.1.clone()), key.clone());
        }
        tables.items.insert(key, item.clone());
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&(key.pk(), key.sk())).cloned())
    }

    async fn query_page(&self, query: &Query, start_after: Option<&ItemKey>) -> Result<Page> {
        let tables = self.tables.read().await;

        let mut matching: Vec<(Key, &Item)> = match &query.target {
            QueryTarget::Partition(pk) => tables
                .items
                .range((pk.clone(), String::new())..)
                .take_while(|((item_pk, _), _)| item_pk == pk)
                .map(|(_, item)| item)
                .filter(|item| query.matches(item))
                .map(|item| (walk_position(&query.target, item.pk(), item.sk()), item))
                .collect(),
            QueryTarget::Index { key, .. } => tables
                .payment_index
                .range((key.clone(), String::new())..)
                .take_while(|((payment_id, _), _)| payment_id == key)
                .filter_map(|(_, table_key)| tables.items.get(table_key))
                .filter(|item| query.matches(item))
                .map(|item| (walk_position(&query.target, item.pk(), item.sk()), item))
                .collect(),
            QueryTarget::Scan => tables
                .items
                .values()
                .filter(|item| query.matches(item))
                .map(|item| (walk_position(&query.target, item.pk(), item.sk()), item))
                .collect(),
        };

        matching.sort_by(|a, b| a.0.cmp(&b.0));
        if query.descending {
            matching.reverse();
        }

        if let Some(cursor) = start_after {
            let cursor = walk_position(&query.target, cursor.pk(), cursor.sk());
            matching.retain(|(position, _)| {
                if query.descending {
                    *position < cursor
                } else {
                    *position > cursor
                }
            });
        }

        let page_size = query.page_size.unwrap_or(self.page_size).max(1);
        let has_more = matching.len() > page_size;
        let items: Vec<Item> = matching
            .into_iter()
            .take(page_size)
            .map(|(_, item)| item.clone())
            .collect();
        let last_key = if has_more {
            items.last().map(|item| item.key.clone())
        } else {
            None
        };

        Ok(Page { items, last_key })
    }
}
