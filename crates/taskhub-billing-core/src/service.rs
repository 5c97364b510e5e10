//! Payment service - order lifecycle and subscription reconciliation

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use taskhub_cache::{keys, Store};
use taskhub_db::{
    CreateOrder, OrderRepository, OrderRow, UpdateSubscription, UserRepository, UserRow,
};
use taskhub_types::{
    AccountType, Order, PaymentMethod, Plan, PlanInfo, SubscriptionStatus, User, UserId,
};

use crate::{
    mock::MockGatewayProvider,
    order_no::generate_order_no,
    provider::{PaymentLink, PaymentProvider, PaymentRequest},
    stripe::StripeProvider,
    webhook::{WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler},
    BillingConfig, BillingError,
};

/// How long the completion lock is held; long enough for the DB writes,
/// short enough that a crashed holder does not wedge the order
const COMPLETION_LOCK_TTL: Duration = Duration::from_secs(10);

/// Payment service
///
/// Owns order creation, the idempotent payment-completion path, and the
/// translation of provider callbacks/webhooks onto that path.
pub struct PaymentService<U: UserRepository, O: OrderRepository> {
    config: BillingConfig,
    users: Arc<U>,
    orders: Arc<O>,
    store: Arc<dyn Store>,
    stripe: Option<StripeProvider>,
    webhook: Option<WebhookHandler>,
}

impl<U: UserRepository, O: OrderRepository> PaymentService<U, O> {
    /// Create a new payment service
    pub fn new(
        config: BillingConfig,
        users: Arc<U>,
        orders: Arc<O>,
        store: Arc<dyn Store>,
    ) -> Self {
        let stripe = config.stripe_secret_key.as_ref().map(|key| {
            let price_ids = config
                .stripe_price_ids
                .iter()
                .map(|(plan, id)| (plan.to_string(), id.clone()))
                .collect();
            StripeProvider::new(
                key.clone(),
                price_ids,
                config.checkout_success_url.clone(),
                config.checkout_cancel_url.clone(),
            )
        });
        let webhook = config
            .stripe_webhook_secret
            .as_ref()
            .map(|secret| WebhookHandler::new(secret.clone()));

        Self {
            config,
            users,
            orders,
            store,
            stripe,
            webhook,
        }
    }

    /// The static plan catalogue
    pub fn plans(&self) -> Vec<PlanInfo> {
        PlanInfo::catalogue()
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create a pending order and obtain its payment page
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        plan: Plan,
        method: PaymentMethod,
    ) -> Result<Order, BillingError> {
        let user = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(BillingError::UserNotFound)?;

        let customer_id = match method {
            PaymentMethod::Stripe => Some(self.ensure_stripe_customer(&user).await?),
            _ => None,
        };

        let order_no = generate_order_no();
        let order = self
            .orders
            .create(CreateOrder {
                id: uuid::Uuid::new_v4(),
                order_no: order_no.clone(),
                user_id: user_id.0,
                plan: plan.to_string(),
                amount_cents: plan.price_cents(),
                payment_method: method.to_string(),
                stripe_customer_id: customer_id.clone(),
            })
            .await?;

        let request = PaymentRequest {
            order_no: order_no.clone(),
            user_id: user_id.to_string(),
            plan,
            amount_cents: order.amount_cents,
            customer_id,
        };

        let link = self.payment_link(method, &request).await?;
        self.orders
            .set_checkout(order.id, &link.url, link.stripe_session_id.as_deref())
            .await?;

        info!(order_no = %order_no, plan = %plan, method = %method, "Order created");

        let row = self
            .orders
            .find_by_order_no(&order_no)
            .await?
            .ok_or(BillingError::OrderNotFound)?;
        Ok(Order::try_from(row)?)
    }

    /// All orders for a user, newest first
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, BillingError> {
        let rows = self.orders.list_by_user(user_id.0).await?;
        rows.into_iter()
            .map(|row| Order::try_from(row).map_err(BillingError::from))
            .collect()
    }

    /// Fetch a single order, checking ownership
    pub async fn get_order(&self, user_id: UserId, order_no: &str) -> Result<Order, BillingError> {
        let row = self
            .orders
            .find_by_order_no(order_no)
            .await?
            .ok_or(BillingError::OrderNotFound)?;
        if row.user_id != user_id.0 {
            return Err(BillingError::Forbidden);
        }
        Ok(Order::try_from(row)?)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Test/dev completion path: pretend the gateway confirmed payment
    #[instrument(skip(self))]
    pub async fn mock_complete(&self, order_no: &str) -> Result<Order, BillingError> {
        let order = self
            .orders
            .find_by_order_no(order_no)
            .await?
            .ok_or(BillingError::OrderNotFound)?;

        if order.status == "paid" {
            return Err(BillingError::AlreadyPaid);
        }

        let trade_no = format!("MOCK{}", Utc::now().timestamp_millis());
        self.complete_payment(order_no, &trade_no, None).await?;

        let row = self
            .orders
            .find_by_order_no(order_no)
            .await?
            .ok_or(BillingError::OrderNotFound)?;
        Ok(Order::try_from(row)?)
    }

    /// Alipay asynchronous notification. Returns true when the order was
    /// completed (or already complete), false for ignorable statuses.
    pub async fn handle_alipay_callback(
        &self,
        out_trade_no: &str,
        trade_no: &str,
        trade_status: &str,
    ) -> Result<bool, BillingError> {
        if trade_status != "TRADE_SUCCESS" && trade_status != "TRADE_FINISHED" {
            info!(order_no = %out_trade_no, trade_status, "Ignoring alipay notification");
            return Ok(false);
        }
        self.complete_payment(out_trade_no, trade_no, None).await?;
        Ok(true)
    }

    /// WeChat asynchronous notification; mirrors the alipay translation.
    pub async fn handle_wechat_callback(
        &self,
        out_trade_no: &str,
        transaction_id: &str,
        result_code: &str,
    ) -> Result<bool, BillingError> {
        if result_code != "SUCCESS" {
            info!(order_no = %out_trade_no, result_code, "Ignoring wechat notification");
            return Ok(false);
        }
        self.complete_payment(out_trade_no, transaction_id, None)
            .await?;
        Ok(true)
    }

    /// Mark an order paid and extend the owner's subscription.
    ///
    /// Idempotent: an already-paid order returns success without side
    /// effects, which is what guards against duplicate webhook delivery.
    /// A short cache lock serializes concurrent deliveries for the same
    /// order; the status check remains the source of truth.
    #[instrument(skip(self))]
    pub async fn complete_payment(
        &self,
        order_no: &str,
        trade_no: &str,
        stripe_subscription_id: Option<&str>,
    ) -> Result<(), BillingError> {
        let lock_key = keys::payment_lock(order_no);
        // A cache outage must not block payment confirmation; the DB
        // status guard still makes the transition single-shot.
        let locked = self
            .store
            .set_nx(&lock_key, "1", COMPLETION_LOCK_TTL)
            .await
            .unwrap_or(true);
        if !locked {
            return Err(BillingError::CompletionInProgress);
        }

        let result = self
            .complete_payment_locked(order_no, trade_no, stripe_subscription_id)
            .await;

        if let Err(e) = self.store.del(&lock_key).await {
            warn!(order_no, error = %e, "Failed to release payment lock");
        }

        result
    }

    async fn complete_payment_locked(
        &self,
        order_no: &str,
        trade_no: &str,
        stripe_subscription_id: Option<&str>,
    ) -> Result<(), BillingError> {
        let order = self
            .orders
            .find_by_order_no(order_no)
            .await?
            .ok_or(BillingError::OrderNotFound)?;

        if order.status == "paid" {
            info!(order_no, "Order already paid, nothing to do");
            return Ok(());
        }
        if order.status != "pending" {
            return Err(BillingError::InvalidOrderState(order.status));
        }

        let updated = self
            .orders
            .mark_paid(order.id, trade_no, stripe_subscription_id, Utc::now())
            .await?;
        if updated == 0 {
            // Lost the race to another completion; that one owns the
            // subscription update
            info!(order_no, "Order was completed concurrently");
            return Ok(());
        }

        info!(order_no, trade_no, "Order marked paid");

        self.activate_subscription(&order, stripe_subscription_id)
            .await
    }

    /// Extend the owner's subscription for the order's plan.
    ///
    /// Active Pro time is never lost: the new expiry starts from the
    /// current expiry when it is still in the future, otherwise from now.
    async fn activate_subscription(
        &self,
        order: &OrderRow,
        stripe_subscription_id: Option<&str>,
    ) -> Result<(), BillingError> {
        let user_row = self
            .users
            .find_by_id(order.user_id)
            .await?
            .ok_or(BillingError::UserNotFound)?;
        let user = User::try_from(user_row)?;

        let plan: Plan = order
            .plan
            .parse()
            .map_err(|_| BillingError::Internal(format!("order has unknown plan {}", order.plan)))?;

        let now = Utc::now();
        let expires_at = next_expiry(&user, plan, now);

        let stripe_subscription_id = stripe_subscription_id
            .map(str::to_string)
            .or_else(|| order.stripe_subscription_id.clone());

        self.users
            .update_subscription(
                order.user_id,
                UpdateSubscription {
                    account_type: Some(AccountType::Pro.to_string()),
                    subscription_status: Some(SubscriptionStatus::Active.to_string()),
                    subscription_expires_at: Some(expires_at),
                    stripe_subscription_id,
                },
            )
            .await?;

        info!(
            user_id = %order.user_id,
            expires_at = %expires_at,
            "Subscription activated"
        );
        Ok(())
    }

    // =========================================================================
    // Stripe webhooks
    // =========================================================================

    /// Verify and process a Stripe webhook delivery
    #[instrument(skip(self, payload, signature))]
    pub async fn process_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), BillingError> {
        let handler = self
            .webhook
            .as_ref()
            .ok_or(BillingError::ProviderNotConfigured("stripe webhook secret"))?;

        let event = handler.verify_and_parse(payload, signature, Utc::now().timestamp())?;
        self.apply_webhook_event(event).await
    }

    async fn apply_webhook_event(&self, event: WebhookEvent) -> Result<(), BillingError> {
        let WebhookEvent {
            id: event_id,
            event_type,
            data,
            ..
        } = event;

        match (&event_type, data) {
            (
                WebhookEventType::CheckoutSessionCompleted,
                WebhookEventData::CheckoutSession(session),
            ) => {
                let Some(order_no) = session.order_no else {
                    warn!(session_id = %session.session_id, "Checkout session without order_no");
                    return Ok(());
                };
                // Prefer the payment intent as the external trade id;
                // subscriptions fall back to the subscription id
                let trade_no = session
                    .payment_intent
                    .or_else(|| session.subscription_id.clone())
                    .unwrap_or_else(|| session.session_id.clone());
                self.complete_payment(&order_no, &trade_no, session.subscription_id.as_deref())
                    .await
            }
            (
                WebhookEventType::CustomerSubscriptionUpdated,
                WebhookEventData::Subscription(sub),
            ) => self.apply_subscription_status(&sub.subscription_id, sub.user_id, &sub.status).await,
            (
                WebhookEventType::CustomerSubscriptionDeleted,
                WebhookEventData::Subscription(sub),
            ) => self.cancel_subscription_order(&sub.subscription_id, sub.user_id).await,
            (WebhookEventType::InvoicePaid, WebhookEventData::Invoice(inv)) => {
                info!(invoice_id = %inv.invoice_id, "Invoice paid");
                Ok(())
            }
            (WebhookEventType::InvoicePaymentFailed, WebhookEventData::Invoice(inv)) => {
                warn!(invoice_id = %inv.invoice_id, "Invoice payment failed");
                Ok(())
            }
            (event_type, _) => {
                info!(?event_type, event_id = %event_id, "Ignoring webhook event");
                Ok(())
            }
        }
    }

    /// Map a Stripe subscription status onto the user's record
    async fn apply_subscription_status(
        &self,
        subscription_id: &str,
        user_id: Option<String>,
        stripe_status: &str,
    ) -> Result<(), BillingError> {
        let Some(user_id) = self.resolve_subscription_user(subscription_id, user_id).await? else {
            warn!(subscription_id, "No user found for subscription update");
            return Ok(());
        };

        let status = match stripe_status {
            "active" | "trialing" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" | "unpaid" | "incomplete_expired" => SubscriptionStatus::Cancelled,
            other => {
                info!(subscription_id, status = other, "Keeping subscription active");
                SubscriptionStatus::Active
            }
        };

        self.users
            .update_subscription(
                user_id,
                UpdateSubscription {
                    subscription_status: Some(status.to_string()),
                    stripe_subscription_id: Some(subscription_id.to_string()),
                    ..UpdateSubscription::default()
                },
            )
            .await?;

        info!(subscription_id, %status, "Subscription status updated");
        Ok(())
    }

    /// Stripe deleted the subscription: drop the user back to free and
    /// cancel the paid order it came from
    async fn cancel_subscription_order(
        &self,
        subscription_id: &str,
        user_id: Option<String>,
    ) -> Result<(), BillingError> {
        if let Some(order) = self
            .orders
            .find_paid_by_stripe_subscription_id(subscription_id)
            .await?
        {
            self.orders.update_status(order.id, "cancelled").await?;
        }

        let Some(user_id) = self.resolve_subscription_user(subscription_id, user_id).await? else {
            warn!(subscription_id, "No user found for subscription deletion");
            return Ok(());
        };

        self.users
            .update_subscription(
                user_id,
                UpdateSubscription {
                    account_type: Some(AccountType::Free.to_string()),
                    subscription_status: Some(SubscriptionStatus::Cancelled.to_string()),
                    ..UpdateSubscription::default()
                },
            )
            .await?;

        info!(subscription_id, "Subscription cancelled");
        Ok(())
    }

    async fn resolve_subscription_user(
        &self,
        subscription_id: &str,
        metadata_user_id: Option<String>,
    ) -> Result<Option<uuid::Uuid>, BillingError> {
        if let Some(raw) = metadata_user_id {
            if let Ok(id) = uuid::Uuid::parse_str(&raw) {
                return Ok(Some(id));
            }
            warn!(subscription_id, user_id = %raw, "Unparseable user_id in metadata");
        }

        Ok(self
            .orders
            .find_paid_by_stripe_subscription_id(subscription_id)
            .await?
            .map(|order| order.user_id))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn payment_link(
        &self,
        method: PaymentMethod,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, BillingError> {
        match method {
            PaymentMethod::Alipay | PaymentMethod::Wechat => {
                MockGatewayProvider::new(self.config.backend_url.clone(), method)
                    .create_payment(request)
                    .await
            }
            PaymentMethod::Stripe => {
                let stripe = self
                    .stripe
                    .as_ref()
                    .ok_or(BillingError::ProviderNotConfigured("stripe secret key"))?;
                stripe.create_payment(request).await
            }
        }
    }

    async fn ensure_stripe_customer(&self, user: &UserRow) -> Result<String, BillingError> {
        if let Some(customer_id) = &user.stripe_customer_id {
            return Ok(customer_id.clone());
        }

        let stripe = self
            .stripe
            .as_ref()
            .ok_or(BillingError::ProviderNotConfigured("stripe secret key"))?;

        let customer = stripe
            .create_customer(
                &user.id.to_string(),
                user.email.as_deref(),
                user.nickname.as_deref(),
            )
            .await?;
        self.users
            .update_stripe_customer_id(user.id, &customer.id)
            .await?;

        Ok(customer.id)
    }
}

impl<U: UserRepository, O: OrderRepository> std::fmt::Debug for PaymentService<U, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("stripe_configured", &self.stripe.is_some())
            .finish_non_exhaustive()
    }
}

/// New subscription expiry after a successful payment: the plan duration
/// on top of the current expiry when Pro is still active, otherwise on
/// top of now. Never earlier than the current expiry.
pub fn next_expiry(user: &User, plan: Plan, now: DateTime<Utc>) -> DateTime<Utc> {
    let base = match user.subscription_expires_at {
        Some(current) if user.is_pro(now) => current,
        _ => now,
    };
    base + ChronoDuration::days(plan.duration_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_types::LoginType;

    fn user(
        account_type: AccountType,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> User {
        User {
            id: UserId::new(),
            phone: None,
            email: Some("u@example.com".to_string()),
            wechat_open_id: None,
            google_id: None,
            github_id: None,
            nickname: None,
            avatar: None,
            login_type: LoginType::Email,
            account_type,
            subscription_status: status,
            subscription_expires_at: expires_at,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_extends_from_active_subscription() {
        let now = Utc::now();
        let current = now + ChronoDuration::days(10);
        let u = user(
            AccountType::Pro,
            SubscriptionStatus::Active,
            Some(current),
        );

        let next = next_expiry(&u, Plan::Monthly, now);
        assert_eq!(next, current + ChronoDuration::days(30));
    }

    #[test]
    fn expiry_restarts_from_now_when_lapsed() {
        let now = Utc::now();
        let stale = now - ChronoDuration::days(3);
        let u = user(
            AccountType::Pro,
            SubscriptionStatus::Active,
            Some(stale),
        );

        let next = next_expiry(&u, Plan::Quarterly, now);
        assert_eq!(next, now + ChronoDuration::days(90));
    }

    #[test]
    fn expiry_restarts_for_free_users() {
        let now = Utc::now();
        let u = user(AccountType::Free, SubscriptionStatus::Expired, None);

        let next = next_expiry(&u, Plan::Yearly, now);
        assert_eq!(next, now + ChronoDuration::days(365));
    }
}
