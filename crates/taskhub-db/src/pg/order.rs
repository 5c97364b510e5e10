//! PostgreSQL order repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::OrderRow;
use crate::repo::{CreateOrder, OrderRepository};

const ORDER_COLUMNS: &str = "id, order_no, user_id, plan, amount_cents, payment_method, status, \
     trade_no, paid_at, pay_url, stripe_customer_id, stripe_subscription_id, stripe_session_id, \
     created_at, updated_at";

/// PostgreSQL order repository
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_order_no(&self, order_no: &str) -> DbResult<Option<OrderRow>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_no = $1");
        let order = sqlx::query_as::<_, OrderRow>(&query)
            .bind(order_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn find_paid_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<OrderRow>> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE stripe_subscription_id = $1 AND status = 'paid' \
             ORDER BY created_at DESC"
        );
        let order = sqlx::query_as::<_, OrderRow>(&query)
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<OrderRow>> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow> {
        let query = format!(
            r#"
            INSERT INTO orders (id, order_no, user_id, plan, amount_cents, payment_method,
                                stripe_customer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(order.id)
            .bind(&order.order_no)
            .bind(order.user_id)
            .bind(&order.plan)
            .bind(order.amount_cents)
            .bind(&order.payment_method)
            .bind(&order.stripe_customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn set_checkout(
        &self,
        id: Uuid,
        pay_url: &str,
        stripe_session_id: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET pay_url = $1,
                stripe_session_id = COALESCE($2, stripe_session_id),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(pay_url)
        .bind(stripe_session_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        trade_no: &str,
        stripe_subscription_id: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> DbResult<u64> {
        // The status guard makes the transition single-shot even under
        // concurrent webhook deliveries.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'paid',
                trade_no = $1,
                stripe_subscription_id = COALESCE($2, stripe_subscription_id),
                paid_at = $3,
                updated_at = NOW()
            WHERE id = $4 AND status = 'pending'
            "#,
        )
        .bind(trade_no)
        .bind(stripe_subscription_id)
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
