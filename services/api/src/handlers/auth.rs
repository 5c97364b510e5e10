//! Authentication handlers (register, login, SMS codes, logout, me)

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskhub_auth_core::{AuthSession, SmsCodePurpose};
use taskhub_types::User;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EmailCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneCredentials {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneRegisterRequest {
    pub phone: String,
    pub password: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SmsLoginRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    pub phone: String,
    /// "register" or "login"
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct WechatLoginRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthLoginRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: UserPayload,
}

/// User profile as returned by the API
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub login_type: String,
    pub account_type: String,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub is_pro: bool,
}

impl UserPayload {
    /// Build the payload, deriving `is_pro` at response time
    pub fn from_user(user: &User) -> Self {
        let now = Utc::now();
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
            login_type: user.login_type.to_string(),
            account_type: user.account_type.to_string(),
            subscription_status: user.subscription_status.to_string(),
            subscription_expires_at: user.subscription_expires_at,
            is_pro: user.is_pro(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn session_response(session: AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: UserPayload::from_user(&session.user),
        access_token: session.access_token,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register/email
pub async fn register_email(
    State(state): State<AppState>,
    Json(req): Json<EmailCredentials>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.register_email(&req.email, &req.password).await?;
    metrics::counter!("auth_registrations_total", "method" => "email").increment(1);
    Ok(session_response(session))
}

/// POST /api/auth/register/phone
pub async fn register_phone(
    State(state): State<AppState>,
    Json(req): Json<PhoneRegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .auth
        .register_phone(&req.phone, &req.password, &req.code)
        .await?;
    metrics::counter!("auth_registrations_total", "method" => "phone").increment(1);
    Ok(session_response(session))
}

/// POST /api/auth/login/email
pub async fn login_email(
    State(state): State<AppState>,
    Json(req): Json<EmailCredentials>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_email(&req.email, &req.password).await?;
    Ok(session_response(session))
}

/// POST /api/auth/login/phone
pub async fn login_phone(
    State(state): State<AppState>,
    Json(req): Json<PhoneCredentials>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_phone(&req.phone, &req.password).await?;
    Ok(session_response(session))
}

/// POST /api/auth/login/sms
pub async fn login_sms(
    State(state): State<AppState>,
    Json(req): Json<SmsLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_sms(&req.phone, &req.code).await?;
    Ok(session_response(session))
}

/// POST /api/auth/sms/send
pub async fn send_sms_code(
    State(state): State<AppState>,
    Json(req): Json<SendSmsRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let purpose = match req.purpose.as_str() {
        "register" => SmsCodePurpose::Register,
        "login" => SmsCodePurpose::Login,
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown sms purpose: {other}"
            )))
        }
    };

    state.auth.send_sms_code(&req.phone, purpose).await?;
    metrics::counter!("auth_sms_codes_sent_total").increment(1);
    Ok(Json(MessageResponse {
        message: "verification code sent",
    }))
}

/// POST /api/auth/login/wechat
pub async fn login_wechat(
    State(state): State<AppState>,
    Json(req): Json<WechatLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_wechat(&req.code).await?;
    Ok(session_response(session))
}

/// POST /api/auth/login/google
pub async fn login_google(
    State(state): State<AppState>,
    Json(req): Json<OAuthLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_google(&req.access_token).await?;
    Ok(session_response(session))
}

/// POST /api/auth/login/github
pub async fn login_github(
    State(state): State<AppState>,
    Json(req): Json<OAuthLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login_github(&req.access_token).await?;
    Ok(session_response(session))
}

/// POST /api/auth/logout
///
/// Blacklists the presented token for the rest of its lifetime.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.logout(&auth_user.token).await?;
    Ok(Json(MessageResponse {
        message: "logged out",
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserPayload>> {
    let user = state.auth.current_user(auth_user.user_id).await?;
    Ok(Json(UserPayload::from_user(&user)))
}
