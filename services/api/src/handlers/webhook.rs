//! Stripe webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use crate::state::AppState;

/// POST /api/payment/stripe/webhook
///
/// Handle Stripe webhook events with signature verification. Signature
/// and parse failures are 400; processing failures are 500 so Stripe
/// redelivers the event.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    match state.payments.process_stripe_webhook(&body, signature).await {
        Ok(()) => {
            metrics::counter!("payment_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "payment_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());

            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("payment_webhooks_processed_total", "status" => "error").increment(1);

            if matches!(e, taskhub_billing_core::BillingError::WebhookError(_)) {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
