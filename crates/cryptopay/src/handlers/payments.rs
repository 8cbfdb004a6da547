use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tokio_stream::StreamExt;
use uuid::Uuid;

use cryptopay_core::api::ResolvedRoute;
use cryptopay_core::payment::{
    payment_from_item, payment_to_item, CreatePaymentRequest, CreatedPayment, Payment,
    ValidationError,
};
use cryptopay_core::storage::{
    EntityType, IndexName, ItemKey, PutCondition, Query, RepositoryError,
};

use super::{body::parse_json_object, AppError};
use crate::state::AppState;

/// Create a pending payment for an existing user (POST /payments).
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: CreatePaymentRequest = parse_json_object(&body)?;
    let payment = request.into_payment(Uuid::new_v4().to_string(), Utc::now())?;

    let store = state.store_for(route.operation());

    if store.get_item(&ItemKey::user(&payment.user_id)).await?.is_none() {
        return Err(ValidationError::UnknownUser(payment.user_id).into());
    }

    store
        .put_item(&payment_to_item(&payment)?, PutCondition::UniquePaymentId)
        .await?;

    tracing::info!(
        payment_id = %payment.payment_id,
        user_id = %payment.user_id,
        currency = %payment.currency,
        "Created payment"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedPayment {
            payment_id: payment.payment_id,
        }),
    ))
}

/// Get a payment by its payment ID through the secondary index
/// (GET /payments/{id}).
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, AppError> {
    let store = state.store_for(route.operation());
    let mut matches = store.query(Query::index(
        IndexName::PaymentId,
        id.clone(),
        Some(EntityType::Payment),
    ));

    let item = matches
        .next()
        .await
        .transpose()?
        .ok_or(RepositoryError::NotFound {
            entity_type: EntityType::Payment.label(),
            id,
        })?;

    Ok(Json(payment_from_item(item)?))
}

/// List every payment (GET /payments).
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let items = state
        .store_for(route.operation())
        .query_all(Query::scan(EntityType::Payment))
        .await?;

    let payments = items
        .into_iter()
        .map(payment_from_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(payments))
}
