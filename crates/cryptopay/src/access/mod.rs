//! Access control applied uniformly to every API route.
//!
//! Callers present an issued key in the `x-api-key` header, and all callers
//! draw from one shared token bucket.

mod api_key;
mod middleware;
mod throttle;

pub use api_key::{ApiKeyRegistry, API_KEY_HEADER};
pub use middleware::access_control;
pub use throttle::SharedThrottle;
