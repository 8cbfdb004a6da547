use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use cryptopay_core::api::ResolvedRoute;
use cryptopay_core::payment::{
    payment_from_item, user_from_item, user_to_item, CreateUserRequest, CreatedUser, Payment, User,
};
use cryptopay_core::storage::{EntityType, ItemKey, PutCondition, Query, RepositoryError};

use super::{body::parse_json_object, AppError};
use crate::state::AppState;

/// Create a user (POST /users).
pub async fn create_user(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: CreateUserRequest = parse_json_object(&body)?;
    let user = request.into_user(Uuid::new_v4().to_string(), Utc::now())?;

    state
        .store_for(route.operation())
        .put_item(&user_to_item(&user)?, PutCondition::KeyAbsent)
        .await?;

    tracing::info!(user_id = %user.id, "Created user");

    Ok((StatusCode::CREATED, Json(CreatedUser { user_id: user.id })))
}

/// Get a user by ID (GET /users/{id}).
pub async fn get_user(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let item = state
        .store_for(route.operation())
        .get_item(&ItemKey::user(&id))
        .await?
        .ok_or(RepositoryError::NotFound {
            entity_type: EntityType::User.label(),
            id,
        })?;

    Ok(Json(user_from_item(item)?))
}

/// List a user's payments in creation order (GET /users/{id}/payments).
pub async fn get_user_payments(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let items = state
        .store_for(route.operation())
        .query_all(Query::partition(id, EntityType::Payment))
        .await?;

    let payments = items
        .into_iter()
        .map(payment_from_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(payments))
}
