//! In-memory user repository for tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use taskhub_db::{CreateUser, DbResult, UpdateSubscription, UserRepository, UserRow};

/// In-memory `UserRepository`
#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<Vec<UserRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn find<F: Fn(&UserRow) -> bool>(&self, pred: F) -> Option<UserRow> {
        self.users.lock().unwrap().iter().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.id == id))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.email.as_deref() == Some(email)))
    }

    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.phone.as_deref() == Some(phone)))
    }

    async fn find_by_wechat_open_id(&self, open_id: &str) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.wechat_open_id.as_deref() == Some(open_id)))
    }

    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.google_id.as_deref() == Some(google_id)))
    }

    async fn find_by_github_id(&self, github_id: &str) -> DbResult<Option<UserRow>> {
        Ok(self.find(|u| u.github_id.as_deref() == Some(github_id)))
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
            user.updated_at = Utc::now();
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
