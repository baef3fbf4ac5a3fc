//! Metrics aggregate queries
//!
//! Day grouping happens in SQL with the same key as
//! [`crate::period::epoch_day`]: `(created_at + offset_ms) / 86400000`.
//! Windows are half-open, `created_at >= start AND created_at < end`.

use sqlx::PgPool;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Receipt sum per local day key within `[start, end)`
pub async fn daily_receipts(
    pool: &PgPool,
    restaurant_id: &str,
    start: i64,
    end: i64,
    offset_ms: i64,
) -> Result<Vec<(i64, i64)>, BoxError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT (created_at + $4) / 86400000 AS day,
               SUM(total_in_cents)::BIGINT AS receipt
        FROM orders
        WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3
        GROUP BY day
        "#,
    )
    .bind(restaurant_id)
    .bind(start)
    .bind(end)
    .bind(offset_ms)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Order count per local day key since `since`
pub async fn daily_order_counts(
    pool: &PgPool,
    restaurant_id: &str,
    since: i64,
    offset_ms: i64,
) -> Result<Vec<(i64, i64)>, BoxError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT (created_at + $3) / 86400000 AS day, COUNT(*) AS amount
        FROM orders
        WHERE restaurant_id = $1 AND created_at >= $2
        GROUP BY day
        "#,
    )
    .bind(restaurant_id)
    .bind(since)
    .bind(offset_ms)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Receipt sum within `[start, end)`
pub async fn receipt_between(
    pool: &PgPool,
    restaurant_id: &str,
    start: i64,
    end: i64,
) -> Result<i64, BoxError> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(total_in_cents), 0)::BIGINT
        FROM orders
        WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3
        "#,
    )
    .bind(restaurant_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Order count within `[start, end)`, optionally only one status
pub async fn count_between(
    pool: &PgPool,
    restaurant_id: &str,
    start: i64,
    end: i64,
    status: Option<&str>,
) -> Result<i64, BoxError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM orders
        WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3
            AND ($4::TEXT IS NULL OR status = $4)
        "#,
    )
    .bind(restaurant_id)
    .bind(start)
    .bind(end)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Most ordered products of the restaurant
#[derive(sqlx::FromRow)]
pub struct PopularProductRow {
    pub product: String,
    pub amount: i64,
}

pub async fn popular_products(
    pool: &PgPool,
    restaurant_id: &str,
    limit: i64,
) -> Result<Vec<PopularProductRow>, BoxError> {
    let rows: Vec<PopularProductRow> = sqlx::query_as(
        r#"
        SELECT p.name AS product, COUNT(i.id) AS amount
        FROM order_items i
        JOIN orders o ON o.id = i.order_id
        JOIN products p ON p.id = i.product_id
        WHERE o.restaurant_id = $1
        GROUP BY p.id, p.name
        ORDER BY amount DESC, p.name ASC
        LIMIT $2
        "#,
    )
    .bind(restaurant_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
