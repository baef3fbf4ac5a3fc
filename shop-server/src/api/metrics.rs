//! Metrics endpoints
//!
//! Every day boundary is computed in the caller's `utcOffset` (minutes east
//! of UTC), falling back to the configured business offset.

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{DailyReceipt, DayOrdersAmount, MonthOrdersAmount, MonthReceipt, PopularProduct};

use crate::auth::SessionIdentity;
use crate::db::metrics as metric_queries;
use crate::metrics;
use crate::period::{
    self, date_from_epoch_day, day_end_millis, day_start_millis, epoch_day, local_today,
    month_start, previous_month_start, resolve_period,
};
use crate::state::AppState;

use super::ApiResult;

const POPULAR_PRODUCTS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetQuery {
    pub utc_offset: Option<i32>,
}

/// GET /metrics/daily-receipt-in-period
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub utc_offset: Option<i32>,
}

fn resolve_offset(state: &AppState, requested: Option<i32>) -> Result<FixedOffset, AppError> {
    match requested {
        Some(minutes) => period::parse_utc_offset(minutes),
        None => Ok(state.default_utc_offset),
    }
}

fn offset_millis(offset: FixedOffset) -> i64 {
    i64::from(offset.local_minus_utc()) * 1000
}

pub async fn daily_receipt_in_period(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Vec<DailyReceipt>> {
    let restaurant_id = identity.restaurant_id()?;
    let Query(query) = query.map_err(AppError::from)?;
    let offset = resolve_offset(&state, query.utc_offset)?;

    let today = local_today(Utc::now(), offset);
    let period = resolve_period(query.from.as_deref(), query.to.as_deref(), today, offset)?;
    let (start, end) = period.bounds(offset);

    let rows = metric_queries::daily_receipts(
        &state.pool,
        restaurant_id,
        start,
        end,
        offset_millis(offset),
    )
    .await?;

    let by_date = rows
        .into_iter()
        .filter_map(|(day, receipt)| date_from_epoch_day(day).map(|date| (date, receipt)));
    Ok(Json(metrics::daily_receipts(by_date)))
}

/// GET /metrics/day-orders-amount
pub async fn day_orders_amount(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> ApiResult<DayOrdersAmount> {
    let restaurant_id = identity.restaurant_id()?;
    let Query(query) = query.map_err(AppError::from)?;
    let offset = resolve_offset(&state, query.utc_offset)?;

    let now = Utc::now();
    let today = local_today(now, offset);
    let yesterday = today.pred_opt().unwrap_or(today);

    let counts = metric_queries::daily_order_counts(
        &state.pool,
        restaurant_id,
        day_start_millis(yesterday, offset),
        offset_millis(offset),
    )
    .await?;

    Ok(Json(metrics::day_orders_amount(
        counts,
        epoch_day(now.timestamp_millis(), offset),
    )))
}

/// `[start, end)` of the current local month (up to the end of today) and
/// of the whole previous month
fn month_windows(offset: FixedOffset) -> ((i64, i64), (i64, i64)) {
    let today = local_today(Utc::now(), offset);
    let this_month = day_start_millis(month_start(today), offset);
    let last_month = day_start_millis(previous_month_start(today), offset);
    (
        (this_month, day_end_millis(today, offset)),
        (last_month, this_month),
    )
}

/// GET /metrics/month-receipt
pub async fn month_receipt(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> ApiResult<MonthReceipt> {
    let restaurant_id = identity.restaurant_id()?;
    let Query(query) = query.map_err(AppError::from)?;
    let offset = resolve_offset(&state, query.utc_offset)?;
    let ((cur_start, cur_end), (prev_start, prev_end)) = month_windows(offset);

    let current =
        metric_queries::receipt_between(&state.pool, restaurant_id, cur_start, cur_end).await?;
    let previous =
        metric_queries::receipt_between(&state.pool, restaurant_id, prev_start, prev_end).await?;

    Ok(Json(metrics::month_receipt(current, previous)))
}

async fn month_orders(
    state: &AppState,
    identity: &SessionIdentity,
    query: Result<Query<OffsetQuery>, QueryRejection>,
    status: Option<&str>,
) -> ApiResult<MonthOrdersAmount> {
    let restaurant_id = identity.restaurant_id()?;
    let Query(query) = query.map_err(AppError::from)?;
    let offset = resolve_offset(state, query.utc_offset)?;
    let ((cur_start, cur_end), (prev_start, prev_end)) = month_windows(offset);

    let current =
        metric_queries::count_between(&state.pool, restaurant_id, cur_start, cur_end, status)
            .await?;
    let previous =
        metric_queries::count_between(&state.pool, restaurant_id, prev_start, prev_end, status)
            .await?;

    Ok(Json(metrics::month_orders_amount(current, previous)))
}

/// GET /metrics/month-orders-amount
pub async fn month_orders_amount(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> ApiResult<MonthOrdersAmount> {
    month_orders(&state, &identity, query, None).await
}

/// GET /metrics/month-canceled-orders-amount
pub async fn month_canceled_orders_amount(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> ApiResult<MonthOrdersAmount> {
    let canceled = shared::models::OrderStatus::Canceled.as_db();
    month_orders(&state, &identity, query, Some(canceled)).await
}

/// GET /metrics/popular-products
pub async fn popular_products(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<PopularProduct>> {
    let restaurant_id = identity.restaurant_id()?;
    let rows =
        metric_queries::popular_products(&state.pool, restaurant_id, POPULAR_PRODUCTS_LIMIT)
            .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| PopularProduct {
                product: r.product,
                amount: r.amount,
            })
            .collect(),
    ))
}
