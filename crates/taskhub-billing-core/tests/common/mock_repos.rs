//! In-memory repositories for payment-flow tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use taskhub_db::{
    CreateOrder, CreateUser, DbResult, OrderRepository, OrderRow, UpdateSubscription,
    UserRepository, UserRow,
};

/// In-memory `UserRepository`
#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<Vec<UserRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a free-tier user and return its row
    pub fn seed_free_user(&self) -> UserRow {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            phone: None,
            email: Some("payer@example.com".to_string()),
            wechat_open_id: None,
            google_id: None,
            github_id: None,
            password_hash: None,
            nickname: Some("payer".to_string()),
            avatar: None,
            login_type: "email".to_string(),
            account_type: "free".to_string(),
            subscription_status: "expired".to_string(),
            subscription_expires_at: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(row.clone());
        row
    }

    pub fn get(&self, id: Uuid) -> UserRow {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("user exists")
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_phone(&self, _phone: &str) -> DbResult<Option<UserRow>> {
        Ok(None)
    }

    async fn find_by_wechat_open_id(&self, _open_id: &str) -> DbResult<Option<UserRow>> {
        Ok(None)
    }

    async fn find_by_google_id(&self, _google_id: &str) -> DbResult<Option<UserRow>> {
        Ok(None)
    }

    async fn find_by_github_id(&self, _github_id: &str) -> DbResult<Option<UserRow>> {
        Ok(None)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let now = Utc::now();
        let row = UserRow {
            id: user.id,
            phone: user.phone,
            email: user.email,
            wechat_open_id: user.wechat_open_id,
            google_id: user.google_id,
            github_id: user.github_id,
            password_hash: user.password_hash,
            nickname: user.nickname,
            avatar: user.avatar,
            login_type: user.login_type,
            account_type: "free".to_string(),
            subscription_status: "expired".to_string(),
            subscription_expires_at: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> DbResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            if let Some(n) = nickname {
                user.nickname = Some(n.to_string());
            }
            if let Some(a) = avatar {
                user.avatar = Some(a.to_string());
            }
        }
        Ok(())
    }

    async fn update_subscription(&self, id: Uuid, update: UpdateSubscription) -> DbResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            if let Some(account_type) = update.account_type {
                user.account_type = account_type;
            }
            if let Some(status) = update.subscription_status {
                user.subscription_status = status;
            }
            if let Some(expires_at) = update.subscription_expires_at {
                user.subscription_expires_at = Some(expires_at);
            }
            if let Some(sub_id) = update.stripe_subscription_id {
                user.stripe_subscription_id = Some(sub_id);
            }
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.stripe_customer_id = Some(customer_id.to_string());
        }
        Ok(())
    }
}

/// In-memory `OrderRepository`
#[derive(Default)]
pub struct MockOrderRepository {
    orders: Mutex<Vec<OrderRow>>,
}

impl MockOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_no: &str) -> OrderRow {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_no == order_no)
            .cloned()
            .expect("order exists")
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn find_by_order_no(&self, order_no: &str) -> DbResult<Option<OrderRow>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_no == order_no)
            .cloned())
    }

    async fn find_paid_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<OrderRow>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| {
                o.stripe_subscription_id.as_deref() == Some(subscription_id) && o.status == "paid"
            })
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<OrderRow>> {
        let mut rows: Vec<OrderRow> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow> {
        let now = Utc::now();
        let row = OrderRow {
            id: order.id,
            order_no: order.order_no,
            user_id: order.user_id,
            plan: order.plan,
            amount_cents: order.amount_cents,
            payment_method: order.payment_method,
            status: "pending".to_string(),
            trade_no: None,
            paid_at: None,
            pay_url: None,
            stripe_customer_id: order.stripe_customer_id,
            stripe_subscription_id: None,
            stripe_session_id: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn set_checkout(
        &self,
        id: Uuid,
        pay_url: &str,
        stripe_session_id: Option<&str>,
    ) -> DbResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if let Some(order) = orders.iter_mut().find(|o| o.id == id) {
            order.pay_url = Some(pay_url.to_string());
            if let Some(session) = stripe_session_id {
                order.stripe_session_id = Some(session.to_string());
            }
        }
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        trade_no: &str,
        stripe_subscription_id: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> DbResult<u64> {
        let mut orders = self.orders.lock().unwrap();
        match orders.iter_mut().find(|o| o.id == id && o.status == "pending") {
            Some(order) => {
                order.status = "paid".to_string();
                order.trade_no = Some(trade_no.to_string());
                if let Some(sub) = stripe_subscription_id {
                    order.stripe_subscription_id = Some(sub.to_string());
                }
                order.paid_at = Some(paid_at);
                order.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if let Some(order) = orders.iter_mut().find(|o| o.id == id) {
            order.status = status.to_string();
            order.updated_at = Utc::now();
        }
        Ok(())
    }
}
