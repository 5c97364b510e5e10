//! Configuration for the API service.

use std::time::Duration;

use taskhub_ai::AiConfig;
use taskhub_auth_core::AuthConfig;
use taskhub_billing_core::BillingConfig;
use taskhub_report_core::StorageConfig;
use taskhub_types::Plan;

/// API service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Redis URL; the in-memory store is used when unset
    pub redis_url: Option<String>,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Billing core configuration
    pub billing: BillingConfig,

    /// AI client configuration
    pub ai: AiConfig,

    /// Object storage; PDFs are served inline-only when unset
    pub storage: Option<StorageConfig>,

    /// SMS gateway settings; codes are logged when unset
    pub sms: Option<SmsGatewayConfig>,

    /// Request timeout
    pub request_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,
}

/// SMS gateway settings
#[derive(Debug, Clone)]
pub struct SmsGatewayConfig {
    pub endpoint: String,
    pub api_key: String,
    pub sign_name: String,
    pub template_code: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let redis_url = std::env::var("REDIS_URL").ok();

        // JWT secret (minimum 32 bytes)
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let mut auth = AuthConfig::new(jwt_secret.clone())
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        if let (Ok(app_id), Ok(secret)) = (
            std::env::var("WECHAT_APP_ID"),
            std::env::var("WECHAT_APP_SECRET"),
        ) {
            auth = auth.with_wechat(app_id, secret);
        }

        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| format!("http://localhost:{http_port}"));

        let mut billing = BillingConfig::new(&backend_url);
        if let (Ok(secret_key), Ok(webhook_secret)) = (
            std::env::var("STRIPE_SECRET_KEY"),
            std::env::var("STRIPE_WEBHOOK_SECRET"),
        ) {
            billing = billing.with_stripe(secret_key, webhook_secret);
        }
        for (plan, var) in [
            (Plan::Monthly, "STRIPE_MONTHLY_PRICE_ID"),
            (Plan::Quarterly, "STRIPE_QUARTERLY_PRICE_ID"),
            (Plan::Yearly, "STRIPE_YEARLY_PRICE_ID"),
        ] {
            if let Ok(price_id) = std::env::var(var) {
                billing = billing.with_price(plan, price_id);
            }
        }
        if let (Ok(success), Ok(cancel)) = (
            std::env::var("CHECKOUT_SUCCESS_URL"),
            std::env::var("CHECKOUT_CANCEL_URL"),
        ) {
            billing = billing.with_checkout_urls(success, cancel);
        }

        let ai = AiConfig::new(std::env::var("AI_API_KEY").ok());

        let storage = match std::env::var("S3_BUCKET") {
            Ok(bucket) => {
                let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
                let endpoint = std::env::var("S3_ENDPOINT").ok();
                let public_base_url = std::env::var("S3_PUBLIC_BASE_URL").unwrap_or_else(|_| {
                    format!("https://{bucket}.s3.{region}.amazonaws.com")
                });
                Some(StorageConfig {
                    bucket,
                    region,
                    endpoint,
                    public_base_url,
                })
            }
            Err(_) => None,
        };

        let sms = match (
            std::env::var("SMS_GATEWAY_URL"),
            std::env::var("SMS_API_KEY"),
        ) {
            (Ok(endpoint), Ok(api_key)) => Some(SmsGatewayConfig {
                endpoint,
                api_key,
                sign_name: std::env::var("SMS_SIGN_NAME").unwrap_or_default(),
                template_code: std::env::var("SMS_TEMPLATE_CODE").unwrap_or_default(),
            }),
            _ => None,
        };

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            redis_url,
            auth,
            billing,
            ai,
            storage,
            sms,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
