//! Order endpoints: list, details and lifecycle transitions

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderDetails, OrderListResponse, OrderStatus, PageMeta};
use validator::Validate;

use crate::auth::SessionIdentity;
use crate::db::orders::{self as order_queries, OrderFilter};
use crate::error::ServiceError;
use crate::orders::{OrderTransition, apply_transition};
use crate::state::AppState;
use crate::util::escape_like;

use super::ApiResult;

const ORDERS_PER_PAGE: i64 = 10;

/// GET /orders
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    #[validate(range(min = 0, max = 100_000, message = "Invalid page index"))]
    pub page_index: Option<i64>,
    #[validate(length(max = 64, message = "Order id filter is too long"))]
    pub order_id: Option<String>,
    #[validate(length(max = 100, message = "Customer name filter is too long"))]
    pub customer_name: Option<String>,
    pub status: Option<OrderStatus>,
}

/// Trimmed, `LIKE`-escaped filter value; blank means no filter
fn like_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(escape_like)
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> ApiResult<OrderListResponse> {
    let restaurant_id = identity.restaurant_id()?;
    let Query(query) = query.map_err(AppError::from)?;
    query.validate().map_err(AppError::from)?;

    let page_index = query.page_index.unwrap_or(0);
    let order_id = like_filter(query.order_id.as_deref());
    let customer_name = like_filter(query.customer_name.as_deref());
    let filter = OrderFilter {
        order_id_prefix: order_id.as_deref(),
        customer_name: customer_name.as_deref(),
        status: query.status,
    };

    let orders = order_queries::list_orders(
        &state.pool,
        restaurant_id,
        &filter,
        ORDERS_PER_PAGE,
        page_index * ORDERS_PER_PAGE,
    )
    .await?;
    let total_count = order_queries::count_orders(&state.pool, restaurant_id, &filter).await?;

    Ok(Json(OrderListResponse {
        orders,
        meta: PageMeta {
            page_index,
            per_page: ORDERS_PER_PAGE,
            total_count,
        },
    }))
}

/// GET /orders/{id}
pub async fn get_order_details(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<OrderDetails> {
    let restaurant_id = identity.restaurant_id()?;
    let Path(order_id) = path.map_err(AppError::from)?;

    let details = order_queries::get_order_details(&state.pool, &order_id, restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(details))
}

async fn run_transition(
    state: AppState,
    identity: SessionIdentity,
    path: Result<Path<String>, PathRejection>,
    op: OrderTransition,
) -> Result<StatusCode, ServiceError> {
    let restaurant_id = identity.restaurant_id()?;
    let Path(order_id) = path.map_err(AppError::from)?;
    apply_transition(&state.pool, &order_id, restaurant_id, op).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /orders/{id}/approve
pub async fn approve_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    run_transition(state, identity, path, OrderTransition::Approve).await
}

/// PATCH /orders/{id}/dispatch
pub async fn dispatch_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    run_transition(state, identity, path, OrderTransition::Dispatch).await
}

/// PATCH /orders/{id}/deliver
pub async fn deliver_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    run_transition(state, identity, path, OrderTransition::Deliver).await
}

/// PATCH /orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    run_transition(state, identity, path, OrderTransition::Cancel).await
}
