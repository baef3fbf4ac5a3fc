//! Order queries

use async_trait::async_trait;
use shared::models::{
    OrderCustomer, OrderDetails, OrderItemDetail, OrderStatus, OrderSummary,
};
use sqlx::PgPool;

use crate::error::{ServiceError, ServiceResult};
use crate::orders::OrderStore;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn parse_status(raw: &str) -> Result<OrderStatus, BoxError> {
    OrderStatus::from_db(raw).ok_or_else(|| format!("Unknown order status in database: {raw}").into())
}

#[async_trait]
impl OrderStore for PgPool {
    async fn update_status_if(
        &self,
        order_id: &str,
        restaurant_id: &str,
        allowed: &[OrderStatus],
        target: OrderStatus,
    ) -> ServiceResult<bool> {
        let allowed: Vec<&str> = allowed.iter().map(|s| s.as_db()).collect();
        let result = sqlx::query(
            "UPDATE orders SET status = $1 WHERE id = $2 AND restaurant_id = $3 AND status = ANY($4)",
        )
        .bind(target.as_db())
        .bind(order_id)
        .bind(restaurant_id)
        .bind(allowed)
        .execute(self)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_status(
        &self,
        order_id: &str,
        restaurant_id: &str,
    ) -> ServiceResult<Option<OrderStatus>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 AND restaurant_id = $2")
                .bind(order_id)
                .bind(restaurant_id)
                .fetch_optional(self)
                .await?;
        raw.map(|s| parse_status(&s))
            .transpose()
            .map_err(ServiceError::Db)
    }
}

/// Filters of the order list; `None` disables a filter
#[derive(Debug, Default)]
pub struct OrderFilter<'a> {
    /// Already `LIKE`-escaped id prefix
    pub order_id_prefix: Option<&'a str>,
    /// Already `LIKE`-escaped customer name fragment
    pub customer_name: Option<&'a str>,
    pub status: Option<OrderStatus>,
}

/// `CASE` expression ranking statuses for listings
fn status_priority_sql() -> String {
    let arms: String = OrderStatus::ALL
        .iter()
        .map(|s| format!(" WHEN '{}' THEN {}", s.as_db(), s.list_priority()))
        .collect();
    format!("CASE o.status{arms} ELSE 999 END")
}

const ORDER_FILTER_SQL: &str = r#"
    o.restaurant_id = $1
    AND ($2::TEXT IS NULL OR o.id LIKE $2 || '%')
    AND ($3::TEXT IS NULL OR u.name ILIKE '%' || $3 || '%')
    AND ($4::TEXT IS NULL OR o.status = $4)
"#;

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    order_id: String,
    created_at: i64,
    status: String,
    customer_name: Option<String>,
    total: i64,
}

pub async fn list_orders(
    pool: &PgPool,
    restaurant_id: &str,
    filter: &OrderFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<OrderSummary>, BoxError> {
    let sql = format!(
        r#"
        SELECT o.id AS order_id, o.created_at, o.status, u.name AS customer_name,
               o.total_in_cents AS total
        FROM orders o
        LEFT JOIN users u ON u.id = o.customer_id
        WHERE {ORDER_FILTER_SQL}
        ORDER BY {} ASC, o.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
        status_priority_sql()
    );
    let rows: Vec<OrderSummaryRow> = sqlx::query_as(&sql)
        .bind(restaurant_id)
        .bind(filter.order_id_prefix)
        .bind(filter.customer_name)
        .bind(filter.status.map(|s| s.as_db()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|r| -> Result<OrderSummary, BoxError> {
            Ok(OrderSummary {
                status: parse_status(&r.status)?,
                order_id: r.order_id,
                created_at: r.created_at,
                customer_name: r.customer_name,
                total: r.total,
            })
        })
        .collect()
}

pub async fn count_orders(
    pool: &PgPool,
    restaurant_id: &str,
    filter: &OrderFilter<'_>,
) -> Result<i64, BoxError> {
    let sql = format!(
        "SELECT COUNT(*) FROM orders o LEFT JOIN users u ON u.id = o.customer_id WHERE {ORDER_FILTER_SQL}"
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(restaurant_id)
        .bind(filter.order_id_prefix)
        .bind(filter.customer_name)
        .bind(filter.status.map(|s| s.as_db()))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[derive(sqlx::FromRow)]
struct OrderDetailRow {
    id: String,
    created_at: i64,
    status: String,
    total_in_cents: i64,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    price_in_cents: i64,
    quantity: i32,
    product_name: Option<String>,
}

/// Order with customer and items, scoped to the restaurant
pub async fn get_order_details(
    pool: &PgPool,
    order_id: &str,
    restaurant_id: &str,
) -> Result<Option<OrderDetails>, BoxError> {
    let row: Option<OrderDetailRow> = sqlx::query_as(
        r#"
        SELECT o.id, o.created_at, o.status, o.total_in_cents,
               u.name AS customer_name, u.email AS customer_email, u.phone AS customer_phone
        FROM orders o
        LEFT JOIN users u ON u.id = o.customer_id
        WHERE o.id = $1 AND o.restaurant_id = $2
        "#,
    )
    .bind(order_id)
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<OrderItemRow> = sqlx::query_as(
        r#"
        SELECT i.id, i.price_in_cents, i.quantity, p.name AS product_name
        FROM order_items i
        LEFT JOIN products p ON p.id = i.product_id
        WHERE i.order_id = $1
        ORDER BY i.id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    let customer = match (row.customer_name, row.customer_email) {
        (Some(name), Some(email)) => Some(OrderCustomer {
            name,
            email,
            phone: row.customer_phone,
        }),
        _ => None,
    };

    Ok(Some(OrderDetails {
        status: parse_status(&row.status)?,
        id: row.id,
        created_at: row.created_at,
        total_in_cents: row.total_in_cents,
        customer,
        order_items: items
            .into_iter()
            .map(|i| OrderItemDetail {
                id: i.id,
                price_in_cents: i.price_in_cents,
                quantity: i.quantity,
                product_name: i.product_name,
            })
            .collect(),
    }))
}
