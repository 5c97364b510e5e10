//! Payment handlers: plans, orders, mock completion, gateway callbacks

use axum::extract::{Form, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use taskhub_types::{Order, PaymentMethod, Plan, PlanInfo};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Record payment operation duration with result label
#[inline]
fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "payment_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub plan: Plan,
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct MockPayRequest {
    pub order_no: String,
}

#[derive(Debug, Deserialize)]
pub struct AlipayNotification {
    pub out_trade_no: String,
    pub trade_no: String,
    pub trade_status: String,
}

#[derive(Debug, Deserialize)]
pub struct WechatNotification {
    pub out_trade_no: String,
    pub transaction_id: String,
    pub result_code: String,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanInfo>,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/payment/plans
pub async fn list_plans(State(state): State<AppState>) -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: state.payments.plans(),
    })
}

/// POST /api/payment/orders
#[instrument(skip(state, auth_user, req), fields(user_id = %auth_user.user_id))]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Json<Order>> {
    let start = Instant::now();

    let order = state
        .payments
        .create_order(auth_user.user_id, req.plan, req.method)
        .await?;

    metrics::counter!("payment_orders_created_total", "method" => req.method.to_string())
        .increment(1);
    record_op_duration("create_order", start, true);

    tracing::info!(order_no = %order.order_no, "Order created");
    Ok(Json(order))
}

/// GET /api/payment/orders
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<OrdersResponse>> {
    let orders = state.payments.list_orders(auth_user.user_id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// GET /api/payment/orders/{order_no}
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(order_no): Path<String>,
) -> ApiResult<Json<Order>> {
    let order = state.payments.get_order(auth_user.user_id, &order_no).await?;
    Ok(Json(order))
}

/// POST /api/payment/mock-pay
///
/// Local/dev stand-in for the gateway's payment page confirming payment.
pub async fn mock_pay(
    State(state): State<AppState>,
    Json(req): Json<MockPayRequest>,
) -> ApiResult<Json<Order>> {
    let start = Instant::now();

    let order = state.payments.mock_complete(&req.order_no).await?;

    metrics::counter!("payment_completions_total", "source" => "mock").increment(1);
    record_op_duration("mock_pay", start, true);
    Ok(Json(order))
}

/// POST /api/payment/alipay/notify
///
/// Alipay asynchronous notification endpoint. The gateway expects the
/// literal body "success" once the notification is accepted.
pub async fn alipay_notify(
    State(state): State<AppState>,
    Form(notification): Form<AlipayNotification>,
) -> ApiResult<&'static str> {
    let completed = state
        .payments
        .handle_alipay_callback(
            &notification.out_trade_no,
            &notification.trade_no,
            &notification.trade_status,
        )
        .await?;

    if completed {
        metrics::counter!("payment_completions_total", "source" => "alipay").increment(1);
    }
    Ok("success")
}

/// POST /api/payment/wechat/notify
pub async fn wechat_notify(
    State(state): State<AppState>,
    Form(notification): Form<WechatNotification>,
) -> ApiResult<&'static str> {
    let completed = state
        .payments
        .handle_wechat_callback(
            &notification.out_trade_no,
            &notification.transaction_id,
            &notification.result_code,
        )
        .await?;

    if completed {
        metrics::counter!("payment_completions_total", "source" => "wechat").increment(1);
    }
    Ok("success")
}
