use thiserror::Error;

/// Rejections raised while validating a request body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object: {0}")]
    MalformedBody(String),
    #[error("Either name or email is required.")]
    MissingUserFields,
    #[error("Invalid name.")]
    InvalidName,
    #[error("Invalid email address.")]
    InvalidEmail,
    #[error("Invalid or missing userId.")]
    InvalidUserId,
    #[error("Invalid or missing amount.")]
    InvalidAmount,
    #[error("Invalid or missing currency.")]
    MissingCurrency,
    #[error("Invalid currency format.")]
    InvalidCurrency,
    #[error("Invalid metadata, expected a JSON object.")]
    InvalidMetadata,
    #[error("Invalid paymentId.")]
    InvalidPaymentId,
    #[error("User {0} does not exist.")]
    UnknownUser(String),
}
