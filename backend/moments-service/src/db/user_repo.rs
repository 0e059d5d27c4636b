use crate::error::Result;
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;

/// Read-only access to users, used to resolve the acting user
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, nickname, profile_img
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
