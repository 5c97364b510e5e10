//! Auth service - credential validation, token lifecycle, identity upserts

use std::sync::Arc;
use std::time::Duration;

use taskhub_cache::{keys, Store};
use taskhub_db::{CreateUser, UserRepository, UserRow};
use taskhub_types::{LoginType, User, UserId};

use crate::{
    crypto::hash_token,
    oauth::{OAuthClient, OAuthUserInfo},
    password::{check_password_policy, hash_password, verify_password},
    sms::{SmsCodePurpose, SmsSender, SmsService},
    token::TokenIssuer,
    AuthConfig, AuthError,
};

/// Result of a successful registration or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token for subsequent requests
    pub access_token: String,
    /// The authenticated user
    pub user: User,
}

/// Identity extracted from a validated request token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID
    pub user_id: UserId,
    /// Login type the token was issued for
    pub login_type: LoginType,
}

enum OAuthProvider {
    Google,
    Github,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Password, SMS-code and OAuth-identity registration and login
/// - Token issuance, validation and the logout blacklist
pub struct AuthService<U: UserRepository> {
    config: AuthConfig,
    users: Arc<U>,
    store: Arc<dyn Store>,
    issuer: TokenIssuer,
    sms: SmsService,
    oauth: OAuthClient,
}

impl<U: UserRepository> AuthService<U> {
    /// Create a new auth service
    pub fn new(
        config: AuthConfig,
        users: Arc<U>,
        store: Arc<dyn Store>,
        sms_sender: Arc<dyn SmsSender>,
    ) -> Self {
        let issuer = TokenIssuer::new(&config.jwt_secret, config.token_validity);
        let sms = SmsService::new(Arc::clone(&store), sms_sender);

        Self {
            config,
            users,
            store,
            issuer,
            sms,
            oauth: OAuthClient::new(),
        }
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Send an SMS verification code
    pub async fn send_sms_code(
        &self,
        phone: &str,
        purpose: SmsCodePurpose,
    ) -> Result<(), AuthError> {
        validate_phone(phone)?;
        self.sms.send_code(phone, purpose).await
    }

    /// Register with email and password
    pub async fn register_email(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        validate_email(email)?;
        check_password_policy(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(email.to_string()));
        }

        let nickname = email.split('@').next().unwrap_or(email).to_string();
        let user = self
            .users
            .create(CreateUser {
                id: UserId::new().0,
                email: Some(email.to_string()),
                password_hash: Some(hash_password(password)?),
                nickname: Some(nickname),
                login_type: LoginType::Email.to_string(),
                ..CreateUser::default()
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AuthError::DuplicateIdentity(email.to_string())
                } else {
                    e.into()
                }
            })?;

        self.issue_session(user)
    }

    /// Register with phone, password and a verification code
    pub async fn register_phone(
        &self,
        phone: &str,
        password: &str,
        code: &str,
    ) -> Result<AuthSession, AuthError> {
        validate_phone(phone)?;
        check_password_policy(password)?;
        self.sms
            .verify_code(phone, code, SmsCodePurpose::Register)
            .await?;

        if self.users.find_by_phone(phone).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(phone.to_string()));
        }

        let nickname = format!("user{}", &phone[phone.len() - 4..]);
        let user = self
            .users
            .create(CreateUser {
                id: UserId::new().0,
                phone: Some(phone.to_string()),
                password_hash: Some(hash_password(password)?),
                nickname: Some(nickname),
                login_type: LoginType::Phone.to_string(),
                ..CreateUser::default()
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AuthError::DuplicateIdentity(phone.to_string())
                } else {
                    e.into()
                }
            })?;

        self.issue_session(user)
    }

    /// Log in with email and password
    pub async fn login_email(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.check_password(&user, password)?;
        self.issue_session(user)
    }

    /// Log in with phone and password
    pub async fn login_phone(&self, phone: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .users
            .find_by_phone(phone)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.check_password(&user, password)?;
        self.issue_session(user)
    }

    /// Log in with phone and SMS code; unknown phones are registered
    pub async fn login_sms(&self, phone: &str, code: &str) -> Result<AuthSession, AuthError> {
        validate_phone(phone)?;
        self.sms
            .verify_code(phone, code, SmsCodePurpose::Login)
            .await?;

        let user = match self.users.find_by_phone(phone).await? {
            Some(user) => user,
            None => {
                let nickname = format!("user{}", &phone[phone.len() - 4..]);
                self.users
                    .create(CreateUser {
                        id: UserId::new().0,
                        phone: Some(phone.to_string()),
                        nickname: Some(nickname),
                        login_type: LoginType::Phone.to_string(),
                        ..CreateUser::default()
                    })
                    .await?
            }
        };

        self.issue_session(user)
    }

    /// Log in with a WeChat authorization code
    pub async fn login_wechat(&self, code: &str) -> Result<AuthSession, AuthError> {
        let open_id = self.oauth.wechat_open_id(&self.config, code).await?;

        let user = match self.users.find_by_wechat_open_id(&open_id).await? {
            Some(user) => user,
            None => {
                self.users
                    .create(CreateUser {
                        id: UserId::new().0,
                        wechat_open_id: Some(open_id),
                        nickname: Some("wechat user".to_string()),
                        login_type: LoginType::Wechat.to_string(),
                        ..CreateUser::default()
                    })
                    .await?
            }
        };

        self.issue_session(user)
    }

    /// Log in with a Google access token
    pub async fn login_google(&self, access_token: &str) -> Result<AuthSession, AuthError> {
        let info = self.oauth.fetch_google_user(access_token).await?;
        let user = self.upsert_oauth_user(OAuthProvider::Google, info).await?;
        self.issue_session(user)
    }

    /// Log in with a GitHub access token
    pub async fn login_github(&self, access_token: &str) -> Result<AuthSession, AuthError> {
        let info = self.oauth.fetch_github_user(access_token).await?;
        let user = self.upsert_oauth_user(OAuthProvider::Github, info).await?;
        self.issue_session(user)
    }

    // =========================================================================
    // Token lifecycle
    // =========================================================================

    /// Validate a bearer token, rejecting blacklisted ones
    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.issuer.validate(token)?;

        let blacklist_key = keys::jwt_blacklist(&hash_token(token));
        if self.store.get(&blacklist_key).await?.is_some() {
            return Err(AuthError::TokenRevoked);
        }

        Ok(AuthenticatedUser {
            user_id: claims.user_id()?,
            login_type: claims
                .login_type
                .parse()
                .map_err(|_| AuthError::InvalidToken)?,
        })
    }

    /// Blacklist a token for the remainder of its validity
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.issuer.validate(token)?;

        let remaining = claims.remaining_validity();
        if remaining > Duration::ZERO {
            let blacklist_key = keys::jwt_blacklist(&hash_token(token));
            self.store.set(&blacklist_key, "1", remaining).await?;
        }
        Ok(())
    }

    /// Load the current user's profile
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AuthError> {
        let row = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(User::try_from(row)?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_password(&self, user: &UserRow, password: &str) -> Result<(), AuthError> {
        let Some(hash) = user.password_hash.as_deref() else {
            // OAuth-only account
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    fn issue_session(&self, row: UserRow) -> Result<AuthSession, AuthError> {
        let user = User::try_from(row)?;
        let access_token = self.issuer.issue(user.id, user.login_type)?;
        Ok(AuthSession { access_token, user })
    }

    async fn upsert_oauth_user(
        &self,
        provider: OAuthProvider,
        info: OAuthUserInfo,
    ) -> Result<UserRow, AuthError> {
        let existing = match provider {
            OAuthProvider::Google => self.users.find_by_google_id(&info.provider_id).await?,
            OAuthProvider::Github => self.users.find_by_github_id(&info.provider_id).await?,
        };

        if let Some(user) = existing {
            // Refresh profile fields the provider may have changed
            if info.nickname.is_some() || info.avatar.is_some() {
                self.users
                    .update_profile(user.id, info.nickname.as_deref(), info.avatar.as_deref())
                    .await?;
            }
            return Ok(user);
        }

        let (google_id, github_id, login_type) = match provider {
            OAuthProvider::Google => (Some(info.provider_id), None, LoginType::Google),
            OAuthProvider::Github => (None, Some(info.provider_id), LoginType::Github),
        };

        Ok(self
            .users
            .create(CreateUser {
                id: UserId::new().0,
                email: info.email,
                google_id,
                github_id,
                nickname: info.nickname,
                avatar: info.avatar,
                login_type: login_type.to_string(),
                ..CreateUser::default()
            })
            .await?)
    }
}

impl<U: UserRepository> std::fmt::Debug for AuthService<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Minimal email shape check: one '@', non-empty local part, dotted domain
fn validate_email(email: &str) -> Result<(), AuthError> {
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        _ => false,
    };
    if !valid {
        return Err(AuthError::Validation("invalid email address".to_string()));
    }
    Ok(())
}

/// Mainland mobile number: 11 digits, 1[3-9] prefix
fn validate_phone(phone: &str) -> Result<(), AuthError> {
    let bytes = phone.as_bytes();
    let valid = bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && bytes.iter().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(AuthError::Validation("invalid phone number".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("missing-at.com").is_err());
        assert!(validate_email("two@@b.com").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn phone_validation() {
        assert!(validate_phone("13800138000").is_ok());
        assert!(validate_phone("19912345678").is_ok());
        assert!(validate_phone("12345678901").is_err()); // 12x prefix
        assert!(validate_phone("1380013800").is_err()); // too short
        assert!(validate_phone("2380013800x").is_err());
    }
}
