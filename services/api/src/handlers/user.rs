//! User profile handlers

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskhub_db::UserRepository;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::auth::UserPayload;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub account_type: String,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub is_pro: bool,
}

/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserPayload>> {
    let user = state.auth.current_user(auth_user.user_id).await?;
    Ok(Json(UserPayload::from_user(&user)))
}

/// PATCH /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserPayload>> {
    if req.nickname.is_none() && req.avatar.is_none() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    if let Some(nickname) = &req.nickname {
        if nickname.trim().is_empty() || nickname.chars().count() > 50 {
            return Err(ApiError::BadRequest(
                "nickname must be 1-50 characters".to_string(),
            ));
        }
    }

    state
        .repos
        .users
        .update_profile(
            auth_user.user_id.0,
            req.nickname.as_deref(),
            req.avatar.as_deref(),
        )
        .await?;

    let user = state.auth.current_user(auth_user.user_id).await?;
    Ok(Json(UserPayload::from_user(&user)))
}

/// GET /api/user/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<SubscriptionResponse>> {
    let user = state.auth.current_user(auth_user.user_id).await?;
    Ok(Json(SubscriptionResponse {
        account_type: user.account_type.to_string(),
        subscription_status: user.subscription_status.to_string(),
        subscription_expires_at: user.subscription_expires_at,
        is_pro: user.is_pro(Utc::now()),
    }))
}
