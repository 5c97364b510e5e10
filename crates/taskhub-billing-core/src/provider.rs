//! Payment provider abstraction

use async_trait::async_trait;

use taskhub_types::Plan;

use crate::BillingError;

/// Everything a provider needs to produce a payment page for an order
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Order number shown to the payment platform
    pub order_no: String,
    /// Owning user, stringified
    pub user_id: String,
    /// Purchased plan
    pub plan: Plan,
    /// Amount in CNY cents
    pub amount_cents: i64,
    /// Stripe customer ID, when the provider needs one
    pub customer_id: Option<String>,
}

/// A payment page handed back to the client
#[derive(Debug, Clone)]
pub struct PaymentLink {
    /// URL the client opens to pay
    pub url: String,
    /// Stripe checkout session ID, when the provider created one
    pub stripe_session_id: Option<String>,
}

/// Payment provider trait
///
/// Abstracts payment processing so the order flow is identical for the
/// mock gateway and Stripe.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment page for a pending order
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink, BillingError>;
}
