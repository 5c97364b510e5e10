//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid token (malformed, bad signature, etc.)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token was blacklisted by logout
    #[error("token revoked")]
    TokenRevoked,

    /// Wrong password or unknown identity
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// An account already exists for the identity
    #[error("identity already registered: {0}")]
    DuplicateIdentity(String),

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Verification code expired or was never sent
    #[error("verification code expired")]
    CodeExpired,

    /// Verification code does not match
    #[error("verification code mismatch")]
    CodeMismatch,

    /// SMS resend window not elapsed
    #[error("code already sent, retry in {retry_after_secs}s")]
    SmsThrottled {
        /// Seconds until another code may be requested
        retry_after_secs: u64,
    },

    /// OAuth provider rejected the exchange
    #[error("oauth error: {0}")]
    OAuth(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Cache error
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::InvalidCredentials => 401,
            Self::UserNotFound => 404,
            Self::DuplicateIdentity(_) => 409,
            Self::Validation(_) | Self::CodeExpired | Self::CodeMismatch | Self::OAuth(_) => 400,
            Self::SmsThrottled { .. } => 429,
            Self::Database(_) | Self::Cache(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::DuplicateIdentity(_) => "DUPLICATE_IDENTITY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::CodeMismatch => "CODE_MISMATCH",
            Self::SmsThrottled { .. } => "SMS_THROTTLED",
            Self::OAuth(_) => "OAUTH_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<taskhub_db::DbError> for AuthError {
    fn from(err: taskhub_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}

impl From<taskhub_cache::CacheError> for AuthError {
    fn from(err: taskhub_cache::CacheError) -> Self {
        tracing::error!("Cache error: {}", err);
        Self::Cache(err.to_string())
    }
}
