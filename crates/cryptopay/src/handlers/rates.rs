use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Query as QueryParams, State},
    Json,
};

use cryptopay_core::api::ResolvedRoute;
use cryptopay_core::payment::{
    filter_by_pair, latest_rates, rate_from_item, Rate, RatesHistoryQuery,
};
use cryptopay_core::storage::{EntityType, Query, StoreHandle, RATE_PARTITION};

use super::AppError;
use crate::state::AppState;

/// Every rate observation, newest first.
async fn rates_newest_first(store: &StoreHandle) -> Result<Vec<Rate>, AppError> {
    let items = store
        .query_all(Query::partition(RATE_PARTITION, EntityType::Rate).descending())
        .await?;

    Ok(items
        .into_iter()
        .map(rate_from_item)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Latest rate per currency pair (GET /rates).
pub async fn get_rates(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let rates = rates_newest_first(&state.store_for(route.operation())).await?;
    Ok(Json(latest_rates(&rates)))
}

/// Rate history, newest first, optionally for one pair (GET /rates/history).
pub async fn get_rates_history(
    State(state): State<AppState>,
    Extension(route): Extension<ResolvedRoute>,
    QueryParams(params): QueryParams<RatesHistoryQuery>,
) -> Result<Json<Vec<Rate>>, AppError> {
    let rates = rates_newest_first(&state.store_for(route.operation())).await?;
    Ok(Json(filter_by_pair(rates, params.pair.as_deref())))
}
