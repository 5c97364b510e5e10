//! Auth service integration tests over mock repositories

mod common;

use std::sync::Arc;
use std::time::Duration;

use taskhub_auth_core::{
    AuthConfig, AuthError, AuthService, LogSmsSender, SmsCodePurpose,
};
use taskhub_cache::{keys, MemoryStore, Store};
use taskhub_types::{AccountType, LoginType};

use common::MockUserRepository;

const SECRET: &str = "test-secret-test-secret-test-secret!";

fn service() -> (AuthService<MockUserRepository>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = AuthConfig::new(SECRET).unwrap();
    let service = AuthService::new(
        config,
        Arc::new(MockUserRepository::new()),
        store.clone(),
        Arc::new(LogSmsSender),
    );
    (service, store)
}

#[tokio::test]
async fn email_register_then_login() {
    let (auth, _) = service();

    let session = auth
        .register_email("alice@example.com", "password1")
        .await
        .unwrap();
    assert_eq!(session.user.email.as_deref(), Some("alice@example.com"));
    assert_eq!(session.user.nickname.as_deref(), Some("alice"));
    assert_eq!(session.user.login_type, LoginType::Email);
    assert_eq!(session.user.account_type, AccountType::Free);

    let login = auth
        .login_email("alice@example.com", "password1")
        .await
        .unwrap();
    assert_eq!(login.user.id, session.user.id);

    // The issued token resolves back to the same user
    let validated = auth.validate_token(&login.access_token).await.unwrap();
    assert_eq!(validated.user_id, session.user.id);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (auth, _) = service();

    auth.register_email("bob@example.com", "password1")
        .await
        .unwrap();
    let err = auth
        .register_email("bob@example.com", "password2")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateIdentity(_)));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (auth, _) = service();

    auth.register_email("carol@example.com", "password1")
        .await
        .unwrap();

    let err = auth
        .login_email("carol@example.com", "nope-nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = auth
        .login_email("unknown@example.com", "password1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn invalid_inputs_fail_validation() {
    let (auth, _) = service();

    assert!(matches!(
        auth.register_email("not-an-email", "password1").await,
        Err(AuthError::Validation(_))
    ));
    assert!(matches!(
        auth.register_email("short@example.com", "12345").await,
        Err(AuthError::Validation(_))
    ));
    assert!(matches!(
        auth.send_sms_code("12345", SmsCodePurpose::Register).await,
        Err(AuthError::Validation(_))
    ));
}

#[tokio::test]
async fn logout_blacklists_the_token() {
    let (auth, _) = service();

    let session = auth
        .register_email("dave@example.com", "password1")
        .await
        .unwrap();

    // Valid before logout
    auth.validate_token(&session.access_token).await.unwrap();

    auth.logout(&session.access_token).await.unwrap();

    let err = auth.validate_token(&session.access_token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));

    // A fresh login issues a token that is not affected
    let fresh = auth
        .login_email("dave@example.com", "password1")
        .await
        .unwrap();
    auth.validate_token(&fresh.access_token).await.unwrap();
}

#[tokio::test]
async fn sms_code_registers_and_is_single_use() {
    let (auth, store) = service();
    let phone = "13800138000";

    auth.send_sms_code(phone, SmsCodePurpose::Register)
        .await
        .unwrap();

    // Pull the code out of the store the way the verifier reads it
    let code = store
        .get(&keys::sms_code("register", phone))
        .await
        .unwrap()
        .expect("code stored");

    let session = auth.register_phone(phone, "password1", &code).await.unwrap();
    assert_eq!(session.user.phone.as_deref(), Some(phone));
    assert_eq!(session.user.nickname.as_deref(), Some("user8000"));

    // The code was consumed on successful verification
    let err = auth
        .register_phone("13800138001", "password1", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CodeExpired | AuthError::CodeMismatch));
}

#[tokio::test]
async fn sms_resend_window_is_enforced() {
    let (auth, _) = service();
    let phone = "13800138000";

    auth.send_sms_code(phone, SmsCodePurpose::Login).await.unwrap();
    let err = auth
        .send_sms_code(phone, SmsCodePurpose::Login)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SmsThrottled { .. }));
}

#[tokio::test]
async fn sms_login_auto_registers_unknown_phones() {
    let (auth, store) = service();
    let phone = "15912345678";

    auth.send_sms_code(phone, SmsCodePurpose::Login).await.unwrap();
    let code = store
        .get(&keys::sms_code("login", phone))
        .await
        .unwrap()
        .unwrap();

    let session = auth.login_sms(phone, &code).await.unwrap();
    assert_eq!(session.user.phone.as_deref(), Some(phone));
    assert_eq!(session.user.login_type, LoginType::Phone);
}

#[tokio::test]
async fn wechat_login_is_stable_per_code_identity() {
    let (auth, _) = service();

    // Unconfigured WeChat derives the open id from the code
    let first = auth.login_wechat("abc123").await.unwrap();
    let second = auth.login_wechat("abc123").await.unwrap();
    assert_eq!(first.user.id, second.user.id);
    assert_eq!(first.user.login_type, LoginType::Wechat);

    let other = auth.login_wechat("xyz789").await.unwrap();
    assert_ne!(other.user.id, first.user.id);
}

#[tokio::test]
async fn short_validity_tokens_report_remaining_lifetime() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let config = AuthConfig::new(SECRET)
        .unwrap()
        .with_token_validity(Duration::from_secs(120));
    let auth = AuthService::new(
        config,
        Arc::new(MockUserRepository::new()),
        store,
        Arc::new(LogSmsSender),
    );

    let session = auth
        .register_email("eve@example.com", "password1")
        .await
        .unwrap();

    // Logout on a short-lived token still blacklists it for the rest of
    // its lifetime
    auth.logout(&session.access_token).await.unwrap();
    assert!(matches!(
        auth.validate_token(&session.access_token).await,
        Err(AuthError::TokenRevoked)
    ));
}
