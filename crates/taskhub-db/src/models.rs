//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Enum-ish columns are stored as text and parsed into the typed enums
//! from `taskhub-types` when a row is lifted into a domain value.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use taskhub_types::{Order, Report, Todo, User};

use crate::error::DbError;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub wechat_open_id: Option<String>,
    pub google_id: Option<String>,
    pub github_id: Option<String>,
    pub password_hash: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub login_type: String,
    pub account_type: String,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Todo row from the database
#[derive(Debug, Clone, FromRow)]
pub struct TodoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub importance: String,
    pub urgency: i16,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order row from the database
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Uuid,
    pub plan: String,
    pub amount_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub trade_no: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub pay_url: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub statistics: Option<serde_json::Value>,
    pub pdf_key: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn decode<T: std::str::FromStr>(kind: &str, value: &str) -> Result<T, DbError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DbError::Decode(format!("{kind} {value:?}: {e}")))
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id.into(),
            phone: row.phone,
            email: row.email,
            wechat_open_id: row.wechat_open_id,
            google_id: row.google_id,
            github_id: row.github_id,
            nickname: row.nickname,
            avatar: row.avatar,
            login_type: decode("login_type", &row.login_type)?,
            account_type: decode("account_type", &row.account_type)?,
            subscription_status: decode("subscription_status", &row.subscription_status)?,
            subscription_expires_at: row.subscription_expires_at,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<TodoRow> for Todo {
    type Error = DbError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        Ok(Todo {
            id: row.id.into(),
            user_id: row.user_id.into(),
            title: row.title,
            description: row.description,
            importance: decode("importance", &row.importance)?,
            urgency: row.urgency,
            status: decode("status", &row.status)?,
            due_date: row.due_date,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id.into(),
            order_no: row.order_no,
            user_id: row.user_id.into(),
            plan: decode("plan", &row.plan)?,
            amount_cents: row.amount_cents,
            payment_method: decode("payment_method", &row.payment_method)?,
            status: decode("status", &row.status)?,
            trade_no: row.trade_no,
            paid_at: row.paid_at,
            pay_url: row.pay_url,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_session_id: row.stripe_session_id,
            created_at: row.created_at,
        })
    }
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id.into(),
            user_id: row.user_id.into(),
            title: row.title,
            content: row.content,
            statistics: row.statistics,
            pdf_key: row.pdf_key,
            pdf_url: row.pdf_url,
            created_at: row.created_at,
        }
    }
}
