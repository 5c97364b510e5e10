//! Taskhub Billing Core - Billing business logic
//!
//! Order lifecycle, the static plan catalogue, payment providers (Stripe
//! plus the mock Alipay/WeChat gateway) and Stripe webhook handling.
//!
//! The one contract worth stating: [`PaymentService::complete_payment`]
//! is idempotent. A paid order stays exactly as it is no matter how many
//! times the provider redelivers the confirmation, and a successful
//! payment only ever extends the subscription expiry.

pub mod config;
pub mod error;
pub mod mock;
pub mod order_no;
pub mod provider;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use mock::MockGatewayProvider;
pub use order_no::generate_order_no;
pub use provider::{PaymentLink, PaymentProvider, PaymentRequest};
pub use service::PaymentService;
pub use stripe::StripeProvider;
pub use webhook::{WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler};
