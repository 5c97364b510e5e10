//! Stripe payment provider implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use crate::provider::{PaymentLink, PaymentProvider, PaymentRequest};
use crate::BillingError;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    secret_key: String,
    /// Plan string -> price ID, resolved from config at construction
    price_ids: HashMap<String, String>,
    success_url: String,
    cancel_url: String,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(
        secret_key: impl Into<String>,
        price_ids: HashMap<String, String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.into(),
            price_ids,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::ProviderError(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BillingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }

    /// Create a Stripe customer tagged with our user ID
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<StripeCustomer, BillingError> {
        debug!(user_id = %user_id, "Creating Stripe customer");

        let mut form: Vec<(&str, &str)> = vec![("metadata[user_id]", user_id)];
        if let Some(e) = email {
            form.push(("email", e));
        }
        if let Some(n) = name {
            form.push(("name", n));
        }

        self.stripe_request(reqwest::Method::POST, "/customers", Some(&form))
            .await
    }

    /// Get a subscription
    #[instrument(skip(self))]
    pub async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, BillingError> {
        debug!(subscription_id = %subscription_id, "Getting Stripe subscription");

        self.stripe_request::<StripeSubscription>(
            reqwest::Method::GET,
            &format!("/subscriptions/{subscription_id}"),
            None,
        )
        .await
    }

    /// Cancel a subscription immediately
    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), BillingError> {
        debug!(subscription_id = %subscription_id, "Canceling subscription");

        let _: StripeSubscription = self
            .stripe_request(
                reqwest::Method::DELETE,
                &format!("/subscriptions/{subscription_id}"),
                None,
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, request), fields(order_no = %request.order_no))]
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink, BillingError> {
        debug!(plan = %request.plan, "Creating checkout session");

        let plan_key = request.plan.to_string();
        let price_id = self
            .price_ids
            .get(&plan_key)
            .ok_or(BillingError::ProviderNotConfigured("stripe price id"))?;

        let customer_id = request
            .customer_id
            .as_deref()
            .ok_or(BillingError::Internal("missing stripe customer".to_string()))?;

        let success_url = format!("{}?session_id={{CHECKOUT_SESSION_ID}}", self.success_url);

        let form = [
            ("customer", customer_id),
            ("mode", "subscription"),
            ("success_url", success_url.as_str()),
            ("cancel_url", self.cancel_url.as_str()),
            ("line_items[0][price]", price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("allow_promotion_codes", "true"),
            ("metadata[order_no]", request.order_no.as_str()),
            ("metadata[user_id]", request.user_id.as_str()),
            ("subscription_data[metadata][order_no]", request.order_no.as_str()),
            ("subscription_data[metadata][user_id]", request.user_id.as_str()),
        ];

        let session: StripeCheckoutSession = self
            .stripe_request(reqwest::Method::POST, "/checkout/sessions", Some(&form))
            .await?;

        Ok(PaymentLink {
            url: session.url.unwrap_or_default(),
            stripe_session_id: Some(session.id),
        })
    }
}

impl std::fmt::Debug for StripeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeProvider")
            .field("price_ids", &self.price_ids)
            .finish_non_exhaustive()
    }
}

// Stripe API response types

/// Stripe customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCustomer {
    /// Customer ID
    pub id: String,
    /// Customer email
    pub email: Option<String>,
    /// Customer name
    pub name: Option<String>,
}

/// Stripe subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID
    pub id: String,
    /// Customer ID
    pub customer: String,
    /// Subscription status
    pub status: String,
    /// Whether subscription cancels at period end
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Metadata we attached at checkout time
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Checkout URL
    pub url: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Subscription ID (after completion)
    pub subscription: Option<String>,
}
