use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cryptopay_core::api::ApiError;
use cryptopay_core::payment::ValidationError;
use cryptopay_core::storage::RepositoryError;

pub struct AppError(pub anyhow::Error);

impl AppError {
    /// The public error this failure surfaces as.
    pub fn api_error(&self) -> ApiError {
        if let Some(api_error) = self.0.downcast_ref::<ApiError>() {
            api_error.clone()
        } else if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            ApiError::from(repo_error)
        } else if let Some(validation_error) = self.0.downcast_ref::<ValidationError>() {
            ApiError::from(validation_error)
        } else {
            ApiError::Internal
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let api_error = self.api_error();
        let status_code =
            StatusCode::from_u16(api_error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self.0, code = api_error.code(), "Request failed");
        } else {
            tracing::warn!(error = %self.0, code = api_error.code(), "Request rejected");
        }

        let mut response = (status_code, Json(api_error.body())).into_response();
        if let ApiError::Throttled { retry_after_secs } = api_error {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
