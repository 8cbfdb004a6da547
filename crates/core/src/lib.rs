//! Functional core for cryptopay.
//!
//! Pure domain types, the single-table key scheme, the store contract, the
//! route and capability tables, and the error taxonomy. Nothing in this crate
//! performs network or disk I/O.

pub mod api;
pub mod payment;
pub mod storage;
pub mod throttle;
