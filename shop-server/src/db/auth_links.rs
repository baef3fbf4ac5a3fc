use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::AuthLinkStore;
use crate::db::{restaurants, users};
use crate::error::ServiceResult;
use crate::util::new_id;

#[async_trait]
impl AuthLinkStore for PgPool {
    async fn find_user_id_by_email(&self, email: &str) -> ServiceResult<Option<String>> {
        Ok(users::find_id_by_email(self, email).await?)
    }

    async fn insert_link(&self, code: &str, user_id: &str, created_at: i64) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO auth_links (id, code, user_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(new_id())
        .bind(code)
        .bind(user_id)
        .bind(created_at)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn consume_link(&self, code: &str, cutoff: i64) -> ServiceResult<Option<String>> {
        let user_id: Option<String> = sqlx::query_scalar(
            "DELETE FROM auth_links WHERE code = $1 AND created_at > $2 RETURNING user_id",
        )
        .bind(code)
        .bind(cutoff)
        .fetch_optional(self)
        .await?;
        Ok(user_id)
    }

    async fn managed_restaurant_id(&self, user_id: &str) -> ServiceResult<Option<String>> {
        Ok(restaurants::managed_restaurant_id(self, user_id).await?)
    }
}
