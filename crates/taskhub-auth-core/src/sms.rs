//! SMS verification codes
//!
//! Codes live in the cache store: 6 digits, 5 minute validity, one send
//! per phone per 60 seconds, single use. Delivery goes through an
//! [`SmsSender`]; deployments without a gateway log the code instead.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use taskhub_cache::{keys, Store};

use crate::crypto::constant_time_str_eq;
use crate::AuthError;

/// Code validity window
const CODE_TTL: Duration = Duration::from_secs(300);
/// Minimum gap between sends to the same phone
const RESEND_WINDOW: Duration = Duration::from_secs(60);

/// What a verification code is for; codes are not interchangeable
/// between purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsCodePurpose {
    Register,
    Login,
}

impl SmsCodePurpose {
    /// Cache key segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

/// SMS delivery interface
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver a verification code to a phone number
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError>;
}

/// Gateway-backed sender posting a JSON payload to a configured endpoint
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sign_name: String,
    template_code: String,
}

impl HttpSmsGateway {
    /// Create a new gateway sender
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sign_name: impl Into<String>,
        template_code: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sign_name: sign_name.into(),
            template_code: template_code.into(),
        }
    }
}

#[async_trait]
impl SmsSender for HttpSmsGateway {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        let body = serde_json::json!({
            "phone_numbers": phone,
            "sign_name": self.sign_name,
            "template_code": self.template_code,
            "template_param": { "code": code },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "SMS gateway request failed");
                AuthError::Internal("sms delivery failed".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %error_body, "SMS gateway error");
            return Err(AuthError::Internal("sms delivery failed".to_string()));
        }

        Ok(())
    }
}

/// Development sender: logs the code instead of delivering it
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        tracing::warn!(phone = %phone, code = %code, "SMS gateway not configured, logging code");
        Ok(())
    }
}

/// Verification code issue/verify service
pub struct SmsService {
    store: Arc<dyn Store>,
    sender: Arc<dyn SmsSender>,
}

impl SmsService {
    /// Create a new SMS service
    pub fn new(store: Arc<dyn Store>, sender: Arc<dyn SmsSender>) -> Self {
        Self { store, sender }
    }

    /// Generate and deliver a verification code.
    ///
    /// Enforces the per-phone resend window before generating anything.
    pub async fn send_code(&self, phone: &str, purpose: SmsCodePurpose) -> Result<(), AuthError> {
        let throttle_key = keys::sms_rate_limit(phone);
        let acquired = self.store.set_nx(&throttle_key, "1", RESEND_WINDOW).await?;
        if !acquired {
            return Err(AuthError::SmsThrottled {
                retry_after_secs: RESEND_WINDOW.as_secs(),
            });
        }

        let code = generate_code();
        let code_key = keys::sms_code(purpose.as_str(), phone);
        self.store.set(&code_key, &code, CODE_TTL).await?;

        self.sender.send_code(phone, &code).await
    }

    /// Verify a code; a successful verification consumes it.
    pub async fn verify_code(
        &self,
        phone: &str,
        code: &str,
        purpose: SmsCodePurpose,
    ) -> Result<(), AuthError> {
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::CodeMismatch);
        }

        let code_key = keys::sms_code(purpose.as_str(), phone);
        let stored = self.store.get(&code_key).await?.ok_or(AuthError::CodeExpired)?;

        if !constant_time_str_eq(&stored, code) {
            return Err(AuthError::CodeMismatch);
        }

        // Consume so a code verifies exactly once
        self.store.del(&code_key).await?;
        Ok(())
    }
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
