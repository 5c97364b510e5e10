//! Payment flow tests: idempotent completion and subscription extension

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

use taskhub_billing_core::{BillingConfig, BillingError, PaymentService};
use taskhub_cache::{keys, MemoryStore, Store};
use taskhub_types::{Order, PaymentMethod, Plan, UserId};

use common::{MockOrderRepository, MockUserRepository};

const WEBHOOK_SECRET: &str = "whsec_payment_flow_tests";

struct Fixture {
    service: PaymentService<MockUserRepository, MockOrderRepository>,
    users: Arc<MockUserRepository>,
    orders: Arc<MockOrderRepository>,
    store: Arc<MemoryStore>,
    user_id: UserId,
}

fn fixture() -> Fixture {
    let users = Arc::new(MockUserRepository::new());
    let orders = Arc::new(MockOrderRepository::new());
    let store = Arc::new(MemoryStore::new());

    let user_row = users.seed_free_user();
    let config = BillingConfig::new("http://localhost:3000")
        .with_stripe("sk_test_unused", WEBHOOK_SECRET);

    let store_dyn: Arc<dyn Store> = store.clone();
    let service = PaymentService::new(config, Arc::clone(&users), Arc::clone(&orders), store_dyn);

    Fixture {
        service,
        users,
        orders,
        store,
        user_id: UserId(user_row.id),
    }
}

async fn create_alipay_order(fx: &Fixture, plan: Plan) -> Order {
    fx.service
        .create_order(fx.user_id, plan, PaymentMethod::Alipay)
        .await
        .unwrap()
}

#[tokio::test]
async fn create_order_produces_a_pending_order_with_pay_url() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    assert_eq!(order.amount_cents, 1990);
    assert!(order.order_no.starts_with("TD"));
    assert!(order
        .pay_url
        .as_deref()
        .unwrap()
        .contains("/api/payment/mock-pay?"));
    assert_eq!(order.status.to_string(), "pending");
    assert!(order.paid_at.is_none());
}

#[tokio::test]
async fn complete_payment_twice_equals_once() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    fx.service
        .complete_payment(&order.order_no, "TRADE_1", None)
        .await
        .unwrap();

    let after_first = fx.orders.get(&order.order_no);
    let user_after_first = fx.users.get(fx.user_id.0);

    // Duplicate delivery: succeeds, changes nothing
    fx.service
        .complete_payment(&order.order_no, "TRADE_2", None)
        .await
        .unwrap();

    let after_second = fx.orders.get(&order.order_no);
    let user_after_second = fx.users.get(fx.user_id.0);

    assert_eq!(after_first.status, "paid");
    assert_eq!(after_second.status, "paid");
    assert_eq!(after_first.trade_no, after_second.trade_no);
    assert_eq!(after_first.paid_at, after_second.paid_at);
    assert_eq!(
        user_after_first.subscription_expires_at,
        user_after_second.subscription_expires_at
    );
}

#[tokio::test]
async fn completion_activates_pro_for_the_plan_duration() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Quarterly).await;

    let before = Utc::now();
    fx.service
        .complete_payment(&order.order_no, "TRADE_1", None)
        .await
        .unwrap();

    let user = fx.users.get(fx.user_id.0);
    assert_eq!(user.account_type, "pro");
    assert_eq!(user.subscription_status, "active");

    let expires = user.subscription_expires_at.unwrap();
    let expected = before + ChronoDuration::days(90);
    assert!((expires - expected).num_seconds().abs() < 5);
}

#[tokio::test]
async fn successive_payments_stack_on_the_active_expiry() {
    let fx = fixture();

    let first = create_alipay_order(&fx, Plan::Monthly).await;
    fx.service
        .complete_payment(&first.order_no, "T1", None)
        .await
        .unwrap();
    let expiry_after_first = fx.users.get(fx.user_id.0).subscription_expires_at.unwrap();

    let second = create_alipay_order(&fx, Plan::Yearly).await;
    fx.service
        .complete_payment(&second.order_no, "T2", None)
        .await
        .unwrap();
    let expiry_after_second = fx.users.get(fx.user_id.0).subscription_expires_at.unwrap();

    // Monotonically extended, by exactly the yearly duration on top of
    // the remaining monthly time
    assert_eq!(
        expiry_after_second,
        expiry_after_first + ChronoDuration::days(365)
    );
}

#[tokio::test]
async fn mock_complete_rejects_an_already_paid_order() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    fx.service.mock_complete(&order.order_no).await.unwrap();
    let err = fx.service.mock_complete(&order.order_no).await.unwrap_err();
    assert!(matches!(err, BillingError::AlreadyPaid));
}

#[tokio::test]
async fn completion_of_unknown_order_is_an_error() {
    let fx = fixture();
    let err = fx
        .service
        .complete_payment("TD_DOES_NOT_EXIST", "T", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::OrderNotFound));
}

#[tokio::test]
async fn held_lock_defers_concurrent_completion() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    // Simulate another in-flight completion holding the lock
    fx.store
        .set_nx(
            &keys::payment_lock(&order.order_no),
            "1",
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    let err = fx
        .service
        .complete_payment(&order.order_no, "T", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::CompletionInProgress));
    assert!(err.is_retryable());

    // Order untouched
    assert_eq!(fx.orders.get(&order.order_no).status, "pending");
}

#[tokio::test]
async fn gateway_callbacks_ignore_non_success_statuses() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    let completed = fx
        .service
        .handle_alipay_callback(&order.order_no, "T", "WAIT_BUYER_PAY")
        .await
        .unwrap();
    assert!(!completed);
    assert_eq!(fx.orders.get(&order.order_no).status, "pending");

    let completed = fx
        .service
        .handle_alipay_callback(&order.order_no, "T", "TRADE_SUCCESS")
        .await
        .unwrap();
    assert!(completed);
    assert_eq!(fx.orders.get(&order.order_no).status, "paid");
}

// =========================================================================
// Stripe webhooks
// =========================================================================

fn sign(payload: &[u8], timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn checkout_completed_payload(order_no: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "cs_1",
            "payment_intent": null,
            "subscription": "sub_1",
            "metadata": { "order_no": order_no }
        }}
    }))
    .unwrap()
}

#[tokio::test]
async fn stripe_webhook_completes_the_order() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    let payload = checkout_completed_payload(&order.order_no);
    let signature = sign(&payload, Utc::now().timestamp());

    fx.service
        .process_stripe_webhook(&payload, &signature)
        .await
        .unwrap();

    let row = fx.orders.get(&order.order_no);
    assert_eq!(row.status, "paid");
    assert_eq!(row.stripe_subscription_id.as_deref(), Some("sub_1"));

    let user = fx.users.get(fx.user_id.0);
    assert_eq!(user.account_type, "pro");
    assert_eq!(user.stripe_subscription_id.as_deref(), Some("sub_1"));
}

#[tokio::test]
async fn stripe_webhook_rejects_bad_signatures() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    let payload = checkout_completed_payload(&order.order_no);
    let err = fx
        .service
        .process_stripe_webhook(&payload, "t=1,v1=deadbeef")
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::WebhookError(_)));
    assert_eq!(fx.orders.get(&order.order_no).status, "pending");
}

#[tokio::test]
async fn subscription_deleted_drops_the_user_to_free() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;

    // Pay via webhook so the subscription id is recorded
    let payload = checkout_completed_payload(&order.order_no);
    fx.service
        .process_stripe_webhook(&payload, &sign(&payload, Utc::now().timestamp()))
        .await
        .unwrap();

    let deleted = serde_json::to_vec(&serde_json::json!({
        "id": "evt_deleted",
        "type": "customer.subscription.deleted",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "canceled",
            "metadata": { "user_id": fx.user_id.to_string() }
        }}
    }))
    .unwrap();

    fx.service
        .process_stripe_webhook(&deleted, &sign(&deleted, Utc::now().timestamp()))
        .await
        .unwrap();

    assert_eq!(fx.orders.get(&order.order_no).status, "cancelled");
    let user = fx.users.get(fx.user_id.0);
    assert_eq!(user.account_type, "free");
    assert_eq!(user.subscription_status, "cancelled");
}

#[tokio::test]
async fn subscription_updated_maps_stripe_statuses() {
    let fx = fixture();
    let order = create_alipay_order(&fx, Plan::Monthly).await;
    let payload = checkout_completed_payload(&order.order_no);
    fx.service
        .process_stripe_webhook(&payload, &sign(&payload, Utc::now().timestamp()))
        .await
        .unwrap();

    let updated = serde_json::to_vec(&serde_json::json!({
        "id": "evt_updated",
        "type": "customer.subscription.updated",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "past_due",
            "metadata": { "user_id": fx.user_id.to_string() }
        }}
    }))
    .unwrap();

    fx.service
        .process_stripe_webhook(&updated, &sign(&updated, Utc::now().timestamp()))
        .await
        .unwrap();

    assert_eq!(fx.users.get(fx.user_id.0).subscription_status, "past_due");
}
