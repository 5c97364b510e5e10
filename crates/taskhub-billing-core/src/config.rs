//! Billing configuration

use std::collections::HashMap;

use taskhub_types::Plan;

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Public base URL of this backend (mock pay pages live under it)
    pub backend_url: String,
    /// Stripe secret key; Stripe checkout is disabled when unset
    pub stripe_secret_key: Option<String>,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: Option<String>,
    /// Map of plans to Stripe price IDs
    pub stripe_price_ids: HashMap<Plan, String>,
    /// Success redirect URL for checkout
    pub checkout_success_url: String,
    /// Cancel redirect URL for checkout
    pub checkout_cancel_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url = backend_url.into();
        let backend_url = backend_url.trim_end_matches('/').to_string();
        Self {
            checkout_success_url: format!("{backend_url}/payment/success"),
            checkout_cancel_url: format!("{backend_url}/payment/cancel"),
            backend_url,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_price_ids: HashMap::new(),
        }
    }

    /// Set Stripe credentials
    pub fn with_stripe(
        mut self,
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        self.stripe_secret_key = Some(secret_key.into());
        self.stripe_webhook_secret = Some(webhook_secret.into());
        self
    }

    /// Set the Stripe price ID for a plan
    pub fn with_price(mut self, plan: Plan, price_id: impl Into<String>) -> Self {
        self.stripe_price_ids.insert(plan, price_id.into());
        self
    }

    /// Set checkout redirect URLs
    pub fn with_checkout_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.checkout_success_url = success_url.into();
        self.checkout_cancel_url = cancel_url.into();
        self
    }

    /// Get the Stripe price ID for a plan
    pub fn price_id(&self, plan: Plan) -> Option<&str> {
        self.stripe_price_ids.get(&plan).map(String::as_str)
    }
}
