//! Error types for DynamoDB operations.

use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Table '{table_name}' not found, run `cargo xtask dynamodb deploy` first")]
    TableNotFound { table_name: String },

    #[error("Table '{table_name}' exists with an incompatible key schema")]
    IncompatibleTable { table_name: String },

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table to become active")]
    TableActivationTimeout,
}
