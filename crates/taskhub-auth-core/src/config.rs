//! Configuration types for the auth service

use std::time::Duration;

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing (minimum 32 bytes)
    pub jwt_secret: String,
    /// How long issued tokens stay valid
    pub token_validity: Duration,
    /// WeChat app id (code login falls back to a derived open id when unset)
    pub wechat_app_id: Option<String>,
    /// WeChat app secret
    pub wechat_app_secret: Option<String>,
}

impl AuthConfig {
    /// Minimum allowed JWT secret length in bytes
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a new auth config.
    ///
    /// # Errors
    /// Returns an error if the secret is shorter than 32 bytes.
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self, crate::AuthError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(crate::AuthError::Configuration(format!(
                "JWT secret too short: got {} bytes, need at least {}",
                jwt_secret.len(),
                Self::MIN_SECRET_LENGTH
            )));
        }
        Ok(Self {
            jwt_secret,
            token_validity: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
            wechat_app_id: None,
            wechat_app_secret: None,
        })
    }

    /// Set the token validity window
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    /// Set WeChat app credentials
    pub fn with_wechat(mut self, app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.wechat_app_id = Some(app_id.into());
        self.wechat_app_secret = Some(secret.into());
        self
    }
}
