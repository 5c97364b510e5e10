//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::{CreateUser, UpdateSubscription, UserRepository};

const USER_COLUMNS: &str = "id, phone, email, wechat_open_id, google_id, github_id, \
     password_hash, nickname, avatar, login_type, account_type, subscription_status, \
     subscription_expires_at, stripe_customer_id, stripe_subscription_id, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_column(&self, column: &str, value: &str) -> DbResult<Option<UserRow>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        self.find_by_column("email", email).await
    }

    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<UserRow>> {
        self.find_by_column("phone", phone).await
    }

    async fn find_by_wechat_open_id(&self, open_id: &str) -> DbResult<Option<UserRow>> {
        self.find_by_column("wechat_open_id", open_id).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>> {
        self.find_by_column("google_id", google_id).await
    }

    async fn find_by_github_id(&self, github_id: &str) -> DbResult<Option<UserRow>> {
        self.find_by_column("github_id", github_id).await
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let query = format!(
            r#"
            INSERT INTO users (id, phone, email, wechat_open_id, google_id, github_id,
                               password_hash, nickname, avatar, login_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id)
            .bind(&user.phone)
            .bind(&user.email)
            .bind(&user.wechat_open_id)
            .bind(&user.google_id)
            .bind(&user.github_id)
            .bind(&user.password_hash)
            .bind(&user.nickname)
            .bind(&user.avatar)
            .bind(&user.login_type)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET nickname = COALESCE($1, nickname),
                avatar = COALESCE($2, avatar),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(nickname)
        .bind(avatar)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_subscription(&self, id: Uuid, update: UpdateSubscription) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET account_type = COALESCE($1, account_type),
                subscription_status = COALESCE($2, subscription_status),
                subscription_expires_at = COALESCE($3, subscription_expires_at),
                stripe_subscription_id = COALESCE($4, stripe_subscription_id),
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&update.account_type)
        .bind(&update.subscription_status)
        .bind(update.subscription_expires_at)
        .bind(&update.stripe_subscription_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET stripe_customer_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(customer_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
