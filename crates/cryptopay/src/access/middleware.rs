use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use cryptopay_core::api::{resolve, ApiError};
use cryptopay_core::throttle::Admission;

use super::API_KEY_HEADER;
use crate::{handlers::AppError, state::AppState};

/// Gate in front of every API route: key check, then the shared throttle,
/// then route resolution. No handler runs unless all three pass.
pub async fn access_control(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let key_present = key.is_some();

    if !state.api_keys.is_valid(key) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            key_present,
            "Rejected request without a valid API key"
        );
        return AppError::from(ApiError::Unauthorized).into_response();
    }

    if let Admission::Throttled { retry_after_ms } = state.throttle.try_acquire() {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            retry_after_ms,
            "Throttled request"
        );
        let retry_after_secs = retry_after_ms.div_ceil(1_000).max(1);
        return AppError::from(ApiError::Throttled { retry_after_secs }).into_response();
    }

    let Some(resolved) = resolve(request.method().as_str(), request.uri().path()) else {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "No route for request"
        );
        return AppError::from(ApiError::not_found(request.uri().path())).into_response();
    };

    tracing::debug!(operation = %resolved.route.operation, "Dispatching request");
    request.extensions_mut().insert(resolved);
    next.run(request).await
}
