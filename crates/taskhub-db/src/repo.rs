//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taskhub_types::TodoSort;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by phone number
    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by WeChat open id
    async fn find_by_wechat_open_id(&self, open_id: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by Google account id
    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by GitHub account id
    async fn find_by_github_id(&self, github_id: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Update profile fields; `None` leaves the column unchanged
    async fn update_profile(
        &self,
        id: Uuid,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> DbResult<()>;

    /// Update subscription state; `None` fields leave the column unchanged
    async fn update_subscription(&self, id: Uuid, update: UpdateSubscription) -> DbResult<()>;

    /// Store the user's Stripe customer ID
    async fn update_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
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
}

/// Subscription state update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub account_type: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub stripe_subscription_id: Option<String>,
}

/// Filters and paging for todo listings
#[derive(Debug, Clone)]
pub struct TodoFilter {
    pub status: Option<String>,
    pub importance: Option<String>,
    pub urgency: Option<i16>,
    pub sort: TodoSort,
    /// 1-based page number
    pub page: i64,
    pub limit: i64,
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            status: None,
            importance: None,
            urgency: None,
            sort: TodoSort::Priority,
            page: 1,
            limit: 20,
        }
    }
}

/// Todo repository trait
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Find a todo by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TodoRow>>;

    /// List a user's todos with filters, sorting and paging.
    /// Returns the page of rows and the total row count for the filter.
    async fn list(&self, user_id: Uuid, filter: &TodoFilter) -> DbResult<(Vec<TodoRow>, i64)>;

    /// All todos for a user (statistics computation)
    async fn list_all(&self, user_id: Uuid) -> DbResult<Vec<TodoRow>>;

    /// Most recent todos for a user (AI history sample)
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<TodoRow>>;

    /// Create a new todo
    async fn create(&self, todo: CreateTodo) -> DbResult<TodoRow>;

    /// Apply a partial update; `None` fields are left unchanged
    async fn update(&self, id: Uuid, update: UpdateTodo) -> DbResult<TodoRow>;

    /// Delete a todo
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create todo input
#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub importance: String,
    pub urgency: i16,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial todo update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub importance: Option<String>,
    pub urgency: Option<i16>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Order repository trait
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by its order number
    async fn find_by_order_no(&self, order_no: &str) -> DbResult<Option<OrderRow>>;

    /// Find the paid order carrying a Stripe subscription ID
    async fn find_paid_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<OrderRow>>;

    /// All orders for a user, newest first
    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<OrderRow>>;

    /// Create a new order
    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow>;

    /// Attach the payment URL / Stripe session produced for the order
    async fn set_checkout(
        &self,
        id: Uuid,
        pay_url: &str,
        stripe_session_id: Option<&str>,
    ) -> DbResult<()>;

    /// Mark a pending order paid. Returns the number of rows updated:
    /// 0 means the order was not pending (already handled elsewhere).
    async fn mark_paid(
        &self,
        id: Uuid,
        trade_no: &str,
        stripe_subscription_id: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> DbResult<u64>;

    /// Update the order status
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()>;
}

/// Create order input
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Uuid,
    pub plan: String,
    pub amount_cents: i64,
    pub payment_method: String,
    pub stripe_customer_id: Option<String>,
}

/// Report repository trait
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Find a report by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ReportRow>>;

    /// All reports for a user, newest first
    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<ReportRow>>;

    /// Create a new report
    async fn create(&self, report: CreateReport) -> DbResult<ReportRow>;

    /// Store the rendered PDF's storage key and URL
    async fn set_pdf(&self, id: Uuid, pdf_key: &str, pdf_url: &str) -> DbResult<()>;

    /// Delete a report
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create report input
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub statistics: Option<serde_json::Value>,
}
