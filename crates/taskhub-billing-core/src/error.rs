//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Order not found
    #[error("order not found")]
    OrderNotFound,

    /// Order belongs to another user
    #[error("order belongs to another user")]
    Forbidden,

    /// Order was already paid
    #[error("order already paid")]
    AlreadyPaid,

    /// Order is in a state the operation does not apply to
    #[error("invalid order state: {0}")]
    InvalidOrderState(String),

    /// Another completion for this order is in flight
    #[error("payment completion already in progress")]
    CompletionInProgress,

    /// The payment method requires a provider that is not configured
    #[error("payment provider not configured: {0}")]
    ProviderNotConfigured(&'static str),

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or processing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] taskhub_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Whether the error is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound | Self::OrderNotFound)
    }

    /// Whether the caller may simply retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CompletionInProgress)
    }
}
