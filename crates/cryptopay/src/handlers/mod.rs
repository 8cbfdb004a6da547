mod body;
pub mod error;
pub mod health;
pub mod payments;
pub mod rates;
pub mod users;

pub use error::AppError;
