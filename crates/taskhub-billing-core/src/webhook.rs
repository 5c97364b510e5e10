//! Stripe webhook handling
//!
//! Signature verification is the only authentication on the webhook
//! endpoint, so it is strict: HMAC-SHA256 over `timestamp.payload`,
//! constant-time comparison, and a five-minute timestamp tolerance.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, instrument, warn};

use crate::error::BillingError;

/// Maximum accepted webhook timestamp skew in seconds
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutSessionCompleted,
    /// Customer subscription updated
    CustomerSubscriptionUpdated,
    /// Customer subscription deleted
    CustomerSubscriptionDeleted,
    /// Invoice paid
    InvoicePaid,
    /// Invoice payment failed
    InvoicePaymentFailed,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Subscription data
    Subscription(SubscriptionData),
    /// Invoice data
    Invoice(InvoiceData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Our order number, from checkout metadata
    pub order_no: Option<String>,
    /// Payment intent (one-time payments)
    pub payment_intent: Option<String>,
    /// Subscription ID (subscription mode)
    pub subscription_id: Option<String>,
}

/// Subscription event data
#[derive(Debug, Clone)]
pub struct SubscriptionData {
    /// Subscription ID
    pub subscription_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Stripe-side status string
    pub status: String,
    /// Our user ID, from subscription metadata
    pub user_id: Option<String>,
    /// Whether it cancels at period end
    pub cancel_at_period_end: bool,
}

/// Invoice event data (logged only)
#[derive(Debug, Clone)]
pub struct InvoiceData {
    /// Invoice ID
    pub invoice_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Invoice status
    pub status: String,
}

/// Webhook handler verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature, now)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify the `Stripe-Signature` header against the payload
    fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<(), BillingError> {
        // Header format: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::WebhookError("invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        let matches: bool = sig_v1.as_bytes().ct_eq(expected.as_bytes()).into();
        if !matches {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::WebhookError("invalid timestamp format".to_string()))?;
        if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::WebhookError("timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BillingError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    order_no: session.metadata.get("order_no").cloned(),
                    payment_intent: session.payment_intent,
                    subscription_id: session.subscription,
                }))
            }
            WebhookEventType::CustomerSubscriptionUpdated
            | WebhookEventType::CustomerSubscriptionDeleted => {
                let sub: RawSubscription = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(WebhookEventData::Subscription(SubscriptionData {
                    subscription_id: sub.id,
                    customer_id: sub.customer,
                    status: sub.status,
                    user_id: sub.metadata.get("user_id").cloned(),
                    cancel_at_period_end: sub.cancel_at_period_end,
                }))
            }
            WebhookEventType::InvoicePaid | WebhookEventType::InvoicePaymentFailed => {
                let inv: RawInvoice = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(WebhookEventData::Invoice(InvoiceData {
                    invoice_id: inv.id,
                    customer_id: inv.customer,
                    status: inv.status.unwrap_or_default(),
                }))
            }
            WebhookEventType::Unknown(_) => {
                info!("Received unknown webhook event type");
                Ok(WebhookEventData::Raw(object))
            }
        }
    }
}

impl std::fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookHandler").finish_non_exhaustive()
    }
}

// Raw Stripe event shapes for parsing

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    payment_intent: Option<String>,
    subscription: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    id: String,
    customer: String,
    status: String,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawInvoice {
    id: String,
    customer: String,
    status: Option<String>,
}
