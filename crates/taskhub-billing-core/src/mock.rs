//! Mock Alipay/WeChat gateway
//!
//! Neither gateway is actually integrated; the provider hands out a URL
//! to this backend's mock payment page, and the mock-pay endpoint drives
//! the same completion flow a real callback would.

use async_trait::async_trait;

use taskhub_types::PaymentMethod;

use crate::provider::{PaymentLink, PaymentProvider, PaymentRequest};
use crate::BillingError;

/// Mock gateway provider for Alipay and WeChat orders
#[derive(Debug, Clone)]
pub struct MockGatewayProvider {
    backend_url: String,
    method: PaymentMethod,
}

impl MockGatewayProvider {
    /// Create a mock provider for a payment method
    pub fn new(backend_url: impl Into<String>, method: PaymentMethod) -> Self {
        Self {
            backend_url: backend_url.into(),
            method,
        }
    }
}

#[async_trait]
impl PaymentProvider for MockGatewayProvider {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink, BillingError> {
        let subject = format!("Taskhub Pro - {}", request.plan.display_name());
        let url = format!(
            "{}/api/payment/mock-pay?order_no={}&amount={}.{:02}&subject={}&method={}",
            self.backend_url.trim_end_matches('/'),
            request.order_no,
            request.amount_cents / 100,
            request.amount_cents % 100,
            urlencode(&subject),
            self.method,
        );

        Ok(PaymentLink {
            url,
            stripe_session_id: None,
        })
    }
}

/// Percent-encode the handful of characters that matter in a query value
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
