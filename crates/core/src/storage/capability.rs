//! Store capabilities granted to handlers.
//!
//! A handler never sees the raw [`Store`]; it receives a [`StoreHandle`]
//! whose capability is fixed when the handle is built. Writes through a
//! read-only handle are refused here, whatever the handler code does.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    collect_items, query_items, Item, ItemKey, ItemStream, PutCondition, Query, RepositoryError,
    Result, Store,
};

/// Access level a handler holds on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ReadOnly,
    ReadWrite,
}

impl Capability {
    pub fn can_write(&self) -> bool {
        matches!(self, Capability::ReadWrite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadOnly => "read-only",
            Capability::ReadWrite => "read-write",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store access restricted to a capability.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn Store>,
    capability: Capability,
    holder: &'static str,
}

impl StoreHandle {
    /// Creates a handle for `holder` (the handler name, used in logs and errors).
    pub fn new(store: Arc<dyn Store>, capability: Capability, holder: &'static str) -> Self {
        Self {
            store,
            capability,
            holder,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn holder(&self) -> &'static str {
        self.holder
    }

    /// `GetItem(pk, sk)`.
    pub async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
        self.store.get_item(key).await
    }

    /// `PutItem(item)`. Refused with `CapabilityDenied` on read-only handles.
    pub async fn put_item(&self, item: &Item, condition: PutCondition) -> Result<()> {
        if !self.capability.can_write() {
            return Err(RepositoryError::CapabilityDenied {
                holder: self.holder,
            });
        }
        self.store.put_item(item, condition).await
    }

    /// Lazy query over the store.
    pub fn query(&self, query: Query) -> ItemStream<'_> {
        query_items(self.store.as_ref(), query)
    }

    /// Runs a query to completion.
    pub async fn query_all(&self, query: Query) -> Result<Vec<Item>> {
        collect_items(self.query(query)).await
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("capability", &self.capability)
            .field("holder", &self.holder)
            .finish()
    }
}
