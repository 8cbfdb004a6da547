//! In-memory storage backend.
//!
//! Holds every item in a `BTreeMap` ordered by `(pk, sk)` plus a derived
//! payment id index, both behind one `Arc<RwLock<_>>`. Used for development,
//! demos and tests; nothing is persisted.

mod store;

pub use store::InMemoryStore;
