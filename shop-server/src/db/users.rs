//! User queries and restaurant onboarding

use shared::error::AppError;
use shared::models::{UserProfile, UserRole};
use sqlx::PgPool;

use crate::error::{ServiceError, ServiceResult};
use crate::util::new_id;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    created_at: i64,
}

pub async fn get_profile(pool: &PgPool, user_id: &str) -> ServiceResult<Option<UserProfile>> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, name, email, phone, role, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| -> ServiceResult<UserProfile> {
        let role = UserRole::from_db(&r.role)
            .ok_or_else(|| ServiceError::Db(format!("Unknown user role: {}", r.role).into()))?;
        Ok(UserProfile {
            id: r.id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            role,
            created_at: r.created_at,
        })
    })
    .transpose()
}

pub async fn find_id_by_email(pool: &PgPool, email: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Input of restaurant onboarding
pub struct NewRestaurant<'a> {
    pub restaurant_name: &'a str,
    pub manager_name: &'a str,
    /// Lowercased email
    pub email: &'a str,
    pub phone: Option<&'a str>,
}

/// Create a manager account and its restaurant in one transaction.
///
/// Returns `(manager_id, restaurant_id)`; a taken email is `ALREADY_EXISTS`.
pub async fn create_manager_with_restaurant(
    pool: &PgPool,
    input: &NewRestaurant<'_>,
    now: i64,
) -> ServiceResult<(String, String)> {
    let manager_id = new_id();
    let restaurant_id = new_id();

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO users (id, name, email, phone, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)",
    )
    .bind(&manager_id)
    .bind(input.manager_name)
    .bind(input.email)
    .bind(input.phone)
    .bind(UserRole::Manager.as_db())
    .bind(now)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return Err(AppError::conflict("Email already registered").into());
        }
        return Err(e.into());
    }

    sqlx::query(
        "INSERT INTO restaurants (id, name, manager_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(&restaurant_id)
    .bind(input.restaurant_name)
    .bind(&manager_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((manager_id, restaurant_id))
}
