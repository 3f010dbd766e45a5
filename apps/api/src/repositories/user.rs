//! User repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::utils::{map_user_insert_error, normalize_email, USER_COLUMNS};
use crate::error::ApiResult;
use crate::models::{NewUser, User};

/// Store operations on user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `DuplicateEmail` if the email is taken;
    /// the store's uniqueness guarantee is the only arbiter.
    async fn create(&self, user: NewUser) -> ApiResult<User>;

    /// Find a user by their unique ID
    async fn find_by_id(&self, user_id: Uuid) -> ApiResult<Option<User>>;

    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// Replace the status line. Returns `None` if the user does not exist.
    async fn update_status(&self, user_id: Uuid, status: &str) -> ApiResult<Option<User>>;

    /// Check that the store is reachable
    async fn ping(&self) -> ApiResult<()>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> ApiResult<User> {
        let email = normalize_email(&user.email);
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_user_insert_error(e, &email))
    }

    async fn find_by_id(&self, user_id: Uuid) -> ApiResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_status(&self, user_id: Uuid, status: &str) -> ApiResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(status)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn ping(&self) -> ApiResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
