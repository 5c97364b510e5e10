//! JWT issuance and validation

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use taskhub_types::{LoginType, UserId};

use crate::AuthError;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Login type the token was issued for
    pub login_type: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl JwtClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Parse the subject into a user ID
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        UserId::parse(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// Remaining validity from now; zero when already expired
    pub fn remaining_validity(&self) -> Duration {
        let secs = self.exp - Utc::now().timestamp();
        Duration::from_secs(secs.max(0) as u64)
    }
}

/// Issues and validates HS256 access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenIssuer {
    /// Create a new token issuer
    pub fn new(secret: &str, validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: UserId, login_type: LoginType) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            login_type: login_type.to_string(),
            iat: now,
            exp: now + self.validity.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("jwt encode error: {e}");
            AuthError::Internal("token issuance failed".to_string())
        })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("token validation failed: {e}");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "0123456789abcdef0123456789abcdef",
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn issue_validate_round_trip() {
        let issuer = issuer();
        let user_id = UserId::new();

        let token = issuer.issue(user_id, LoginType::Email).unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.login_type, "email");
        assert!(!claims.is_expired());
        assert!(claims.remaining_validity() > Duration::from_secs(3500));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let other = TokenIssuer::new(
            "ffffffffffffffffffffffffffffffff",
            Duration::from_secs(3600),
        );
        let token = other.issue(UserId::new(), LoginType::Email).unwrap();

        assert!(matches!(
            issuer().validate(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            issuer().validate("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
