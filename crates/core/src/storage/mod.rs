mod capability;
mod error;
mod item;
mod keys;
pub mod schema;
mod traits;

pub use capability::{Capability, StoreHandle};
pub use error::{RepositoryError, Result};
pub use item::Item;
pub use keys::{format_sort_timestamp, sort_timestamp, EntityType, ItemKey, RATE_PARTITION};
pub use schema::IndexName;
pub use traits::{
    collect_items, query_items, ItemStream, Page, PutCondition, Query, QueryTarget, Store,
};
