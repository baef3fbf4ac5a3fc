use shared::models::Restaurant;
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct RestaurantRow {
    id: String,
    name: String,
    description: Option<String>,
    manager_id: Option<String>,
    created_at: i64,
}

impl From<RestaurantRow> for Restaurant {
    fn from(r: RestaurantRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            manager_id: r.manager_id,
            created_at: r.created_at,
        }
    }
}

/// Restaurant managed by `user_id`, if any
pub async fn find_managed(pool: &PgPool, user_id: &str) -> Result<Option<Restaurant>, sqlx::Error> {
    let row: Option<RestaurantRow> = sqlx::query_as(
        "SELECT id, name, description, manager_id, created_at FROM restaurants WHERE manager_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Restaurant::from))
}

pub async fn managed_restaurant_id(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM restaurants WHERE manager_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
