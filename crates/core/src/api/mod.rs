//! The public API surface: routes, operations and the error taxonomy.

mod error;
mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::{resolve, route_for, HttpMethod, Operation, ResolvedRoute, Route, ROUTES};
