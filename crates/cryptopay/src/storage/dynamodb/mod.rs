//! DynamoDB storage backend.
//!
//! One table keyed by `pk`/`sk` with the `paymentId-index` secondary index,
//! accessed through `aws-sdk-dynamodb`. Payment id uniqueness is enforced by
//! writing a claim marker in the same transaction as the payment.

mod conversions;
mod error;
mod store;

pub use store::DynamoDbStore;
