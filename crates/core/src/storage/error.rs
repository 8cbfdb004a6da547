use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Store throttled the request: {0}")]
    Throttled(String),
    #[error("Store request timed out: {0}")]
    Timeout(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("{holder} holds a read-only store capability and attempted a write")]
    CapabilityDenied { holder: &'static str },
}

impl RepositoryError {
    /// Returns true when the failure is safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RepositoryError::ConnectionFailed(_)
                | RepositoryError::Throttled(_)
                | RepositoryError::Timeout(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
