//! OAuth identity resolution
//!
//! The service never drives the browser redirect itself; clients hand it
//! a provider access token (Google/GitHub) or authorization code
//! (WeChat) and it resolves the stable provider-side identity.

use serde::Deserialize;
use std::time::Duration;

use crate::{AuthConfig, AuthError};

/// Identity resolved from an OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthUserInfo {
    /// Stable provider-side id
    pub provider_id: String,
    /// Email, when the provider shares it
    pub email: Option<String>,
    /// Display name
    pub nickname: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUserInfo {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WechatTokenResponse {
    openid: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

/// Resolves provider identities over HTTP
#[derive(Clone)]
pub struct OAuthClient {
    client: reqwest::Client,
}

impl OAuthClient {
    /// Create a new OAuth client
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Fetch the Google user behind an access token
    pub async fn fetch_google_user(&self, access_token: &str) -> Result<OAuthUserInfo, AuthError> {
        let info: GoogleUserInfo = self
            .fetch_json("https://www.googleapis.com/oauth2/v2/userinfo", access_token)
            .await?;

        Ok(OAuthUserInfo {
            provider_id: info.id,
            email: info.email,
            nickname: info.name,
            avatar: info.picture,
        })
    }

    /// Fetch the GitHub user behind an access token
    pub async fn fetch_github_user(&self, access_token: &str) -> Result<OAuthUserInfo, AuthError> {
        let info: GithubUserInfo = self
            .fetch_json("https://api.github.com/user", access_token)
            .await?;

        Ok(OAuthUserInfo {
            provider_id: info.id.to_string(),
            email: info.email,
            nickname: info.name.or(Some(info.login)),
            avatar: info.avatar_url,
        })
    }

    /// Exchange a WeChat authorization code for the user's open id.
    ///
    /// Without configured app credentials the open id is derived from the
    /// code, which keeps local development working end to end.
    pub async fn wechat_open_id(
        &self,
        config: &AuthConfig,
        code: &str,
    ) -> Result<String, AuthError> {
        let (Some(app_id), Some(secret)) = (&config.wechat_app_id, &config.wechat_app_secret)
        else {
            tracing::warn!("WeChat credentials not configured, deriving open id from code");
            return Ok(format!("wx_{code}"));
        };

        let url = format!(
            "https://api.weixin.qq.com/sns/oauth2/access_token\
             ?appid={app_id}&secret={secret}&code={code}&grant_type=authorization_code"
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "WeChat token exchange failed");
            AuthError::OAuth("wechat exchange failed".to_string())
        })?;

        let token: WechatTokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse WeChat response");
            AuthError::OAuth("wechat exchange failed".to_string())
        })?;

        if let Some(errcode) = token.errcode {
            tracing::warn!(
                errcode,
                errmsg = token.errmsg.as_deref().unwrap_or(""),
                "WeChat rejected the code"
            );
            return Err(AuthError::OAuth("wechat rejected the code".to_string()));
        }

        token
            .openid
            .ok_or_else(|| AuthError::OAuth("wechat response missing openid".to_string()))
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AuthError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            // GitHub requires a User-Agent on API requests
            .header(reqwest::header::USER_AGENT, "taskhub")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "OAuth user-info request failed");
                AuthError::OAuth("provider request failed".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, url = %url, "OAuth provider rejected token");
            return Err(AuthError::OAuth(format!(
                "provider returned status {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse OAuth provider response");
            AuthError::OAuth("invalid provider response".to_string())
        })
    }
}

impl Default for OAuthClient {
    fn default() -> Self {
        Self::new()
    }
}
