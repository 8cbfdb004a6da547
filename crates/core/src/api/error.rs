//! The public error taxonomy and its mapping from internal errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payment::ValidationError;
use crate::storage::RepositoryError;

/// Every error a client can observe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Missing or invalid API key.")]
    Unauthorized,
    #[error("Too many requests.")]
    Throttled { retry_after_secs: u64 },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("The store is temporarily unavailable.")]
    TransientStore,
    #[error("Internal server error.")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::Throttled { .. } => 429,
            ApiError::NotFound(_) => 404,
            ApiError::Validation(_) => 400,
            ApiError::Conflict(_) => 409,
            ApiError::TransientStore => 503,
            ApiError::Internal => 500,
        }
    }

    /// Machine-readable code sent in the body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Throttled { .. } => "THROTTLED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TransientStore => "STORE_UNAVAILABLE",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        ApiError::NotFound(format!("No resource at {path}."))
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&RepositoryError> for ApiError {
    fn from(error: &RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            RepositoryError::AlreadyExists { .. } => ApiError::Conflict(error.to_string()),
            RepositoryError::ConnectionFailed(_)
            | RepositoryError::Throttled(_)
            | RepositoryError::Timeout(_) => ApiError::TransientStore,
            RepositoryError::QueryFailed(_)
            | RepositoryError::Serialization(_)
            | RepositoryError::CapabilityDenied { .. } => ApiError::Internal,
            RepositoryError::InvalidData(message) => ApiError::Validation(message.clone()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        ApiError::from(&error)
    }
}

impl From<&ValidationError> for ApiError {
    fn from(error: &ValidationError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::from(&error)
    }
}
