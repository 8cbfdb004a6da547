//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError` from `cryptopay_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use cryptopay_core::storage::RepositoryError;

/// Errors raised before or instead of a service response.
fn map_transport_error<E, R>(err: SdkError<E, R>) -> Result<E, RepositoryError>
where
    E: Debug,
    R: Debug,
{
    match err {
        SdkError::ServiceError(service) => Ok(service.into_err()),
        SdkError::TimeoutError(e) => Err(RepositoryError::Timeout(format!("{e:?}"))),
        SdkError::DispatchFailure(e) => Err(RepositoryError::ConnectionFailed(format!("{e:?}"))),
        other => Err(RepositoryError::QueryFailed(format!("{other:?}"))),
    }
}

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug>(err: SdkError<GetItemError, R>) -> RepositoryError {
    let err = match map_transport_error(err) {
        Ok(service) => service,
        Err(mapped) => return mapped,
    };
    match err {
        GetItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::Throttled("Throughput exceeded".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            RepositoryError::Throttled("Request limit exceeded".to_string())
        }
        GetItemError::InternalServerError(_) => {
            RepositoryError::ConnectionFailed("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to RepositoryError.
pub fn map_query_error<R: Debug>(err: SdkError<QueryError, R>) -> RepositoryError {
    let err = match map_transport_error(err) {
        Ok(service) => service,
        Err(mapped) => return mapped,
    };
    match err {
        QueryError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table or index not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::Throttled("Throughput exceeded".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            RepositoryError::Throttled("Request limit exceeded".to_string())
        }
        QueryError::InternalServerError(_) => {
            RepositoryError::ConnectionFailed("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to RepositoryError.
pub fn map_scan_error<R: Debug>(err: SdkError<ScanError, R>) -> RepositoryError {
    let err = match map_transport_error(err) {
        Ok(service) => service,
        Err(mapped) => return mapped,
    };
    match err {
        ScanError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        ScanError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::Throttled("Throughput exceeded".to_string())
        }
        ScanError::RequestLimitExceeded(_) => {
            RepositoryError::Throttled("Request limit exceeded".to_string())
        }
        ScanError::InternalServerError(_) => {
            RepositoryError::ConnectionFailed("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("Scan failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to RepositoryError.
pub fn map_put_item_error<R: Debug>(
    err: SdkError<PutItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    let err = match map_transport_error(err) {
        Ok(service) => service,
        Err(mapped) => return mapped,
    };
    match err {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::AlreadyExists {
            entity_type,
            id: id.into(),
        },
        PutItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::Throttled("Throughput exceeded".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            RepositoryError::Throttled("Request limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            RepositoryError::Throttled("Transaction conflict".to_string())
        }
        PutItemError::InternalServerError(_) => {
            RepositoryError::ConnectionFailed("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to RepositoryError.
///
/// A cancelled transaction with a failed condition means the payment key or
/// its id claim already exists.
pub fn map_transact_write_error<R: Debug>(
    err: SdkError<TransactWriteItemsError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    let err = match map_transport_error(err) {
        Ok(service) => service,
        Err(mapped) => return mapped,
    };
    match err {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => {
            let condition_failed = cancelled
                .cancellation_reasons()
                .iter()
                .any(|reason| reason.code() == Some("ConditionalCheckFailed"));
            if condition_failed {
                RepositoryError::AlreadyExists {
                    entity_type,
                    id: id.into(),
                }
            } else {
                RepositoryError::Throttled(format!("Transaction cancelled: {cancelled:?}"))
            }
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            RepositoryError::Throttled("Transaction in progress".to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::Throttled("Throughput exceeded".to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            RepositoryError::Throttled("Request limit exceeded".to_string())
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            RepositoryError::ConnectionFailed("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map a request that could not be built to RepositoryError.
pub fn map_build_error(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::QueryFailed(format!("Invalid request: {err}"))
}
