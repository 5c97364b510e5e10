//! Error types for the API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use taskhub_auth_core::AuthError;
use taskhub_billing_core::BillingError;
use taskhub_report_core::ReportError;
use taskhub_todo_core::TodoError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests")]
    TooManyRequests {
        /// Seconds until the window resets
        retry_after: u64,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Todo(#[from] TodoError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Database error")]
    Db(#[from] taskhub_db::DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Billing(e) => match e {
                BillingError::UserNotFound | BillingError::OrderNotFound => StatusCode::NOT_FOUND,
                BillingError::Forbidden => StatusCode::FORBIDDEN,
                BillingError::AlreadyPaid
                | BillingError::InvalidOrderState(_)
                | BillingError::CompletionInProgress => StatusCode::CONFLICT,
                BillingError::ProviderNotConfigured(_) | BillingError::WebhookError(_) => {
                    StatusCode::BAD_REQUEST
                }
                BillingError::ProviderError(_) => StatusCode::BAD_GATEWAY,
                BillingError::Database(_) | BillingError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Todo(e) => match e {
                TodoError::NotFound => StatusCode::NOT_FOUND,
                TodoError::Forbidden => StatusCode::FORBIDDEN,
                TodoError::Validation(_) => StatusCode::BAD_REQUEST,
                TodoError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Report(e) => match e {
                ReportError::NotFound => StatusCode::NOT_FOUND,
                ReportError::Forbidden => StatusCode::FORBIDDEN,
                ReportError::StorageNotConfigured => StatusCode::BAD_REQUEST,
                ReportError::Render(_) | ReportError::Storage(_) | ReportError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Db(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            Self::Auth(e) => e.error_code(),
            Self::Billing(e) => match e {
                BillingError::UserNotFound => "USER_NOT_FOUND",
                BillingError::OrderNotFound => "ORDER_NOT_FOUND",
                BillingError::Forbidden => "FORBIDDEN",
                BillingError::AlreadyPaid => "ORDER_ALREADY_PAID",
                BillingError::InvalidOrderState(_) => "INVALID_ORDER_STATE",
                BillingError::CompletionInProgress => "COMPLETION_IN_PROGRESS",
                BillingError::ProviderNotConfigured(_) => "PROVIDER_NOT_CONFIGURED",
                BillingError::ProviderError(_) => "PROVIDER_ERROR",
                BillingError::WebhookError(_) => "WEBHOOK_ERROR",
                BillingError::Database(_) | BillingError::Internal(_) => "INTERNAL_ERROR",
            },
            Self::Todo(e) => match e {
                TodoError::NotFound => "TODO_NOT_FOUND",
                TodoError::Forbidden => "FORBIDDEN",
                TodoError::Validation(_) => "VALIDATION_ERROR",
                TodoError::Database(_) => "INTERNAL_ERROR",
            },
            Self::Report(e) => match e {
                ReportError::NotFound => "REPORT_NOT_FOUND",
                ReportError::Forbidden => "FORBIDDEN",
                ReportError::StorageNotConfigured => "STORAGE_NOT_CONFIGURED",
                ReportError::Render(_) => "PDF_RENDER_ERROR",
                ReportError::Storage(_) | ReportError::Database(_) => "INTERNAL_ERROR",
            },
            Self::Db(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let retry_after = match &self {
            Self::TooManyRequests { retry_after } => Some(*retry_after),
            Self::Auth(AuthError::SmsThrottled { retry_after_secs }) => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                retry_after,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
