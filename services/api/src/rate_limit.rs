//! Fixed-window rate limiting against the shared cache store.
//!
//! Each request increments `ratelimit:{METHOD:path}:{client}` with the
//! window as TTL; request N passes, request N+1 is rejected until the
//! window key expires. A cache outage fails open: throttling is load
//! protection, not a security boundary.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use taskhub_cache::{keys, Store};

use crate::error::ApiError;
use crate::state::AppState;

/// Requests allowed per window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub limit: i64,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Auth endpoints: brute-force sensitive
    pub const AUTH: Self = Self {
        limit: 10,
        window: Duration::from_secs(60),
    };

    /// General API traffic
    pub const API: Self = Self {
        limit: 120,
        window: Duration::from_secs(60),
    };

    /// AI analysis: expensive upstream calls
    pub const AI: Self = Self {
        limit: 5,
        window: Duration::from_secs(60),
    };
}

/// Outcome of a rate-limit check, for response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub limit: i64,
    pub remaining: i64,
}

/// Count a request against the window. `Err` carries the 429.
pub async fn check_rate_limit(
    store: &Arc<dyn Store>,
    policy: RateLimitPolicy,
    action: &str,
    identifier: &str,
) -> Result<RateLimitStatus, ApiError> {
    let key = keys::rate_limit(action, identifier);

    let count = match store.incr(&key, policy.window).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit store unavailable, failing open");
            return Ok(RateLimitStatus {
                limit: policy.limit,
                remaining: policy.limit,
            });
        }
    };

    if count > policy.limit {
        metrics::counter!("api_rate_limited_total").increment(1);
        return Err(ApiError::TooManyRequests {
            retry_after: policy.window.as_secs(),
        });
    }

    Ok(RateLimitStatus {
        limit: policy.limit,
        remaining: (policy.limit - count).max(0),
    })
}

/// Middleware enforcing a policy for the routes it wraps
pub async fn rate_limit(
    State((state, policy)): State<(AppState, RateLimitPolicy)>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let action = format!("{}:{}", request.method(), request.uri().path());
    let identifier = addr.ip().to_string();

    match check_rate_limit(&state.store, policy, &action, &identifier).await {
        Ok(status) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                header_value(status.limit),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                header_value(status.remaining),
            );
            response
        }
        Err(err) => {
            let retry_after = policy.window.as_secs();
            let mut response = err.into_response();
            response.headers_mut().insert(
                HeaderName::from_static("retry-after"),
                header_value(retry_after as i64),
            );
            response
        }
    }
}

fn header_value(n: i64) -> HeaderValue {
    HeaderValue::from_str(&n.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_cache::MemoryStore;

    #[tokio::test]
    async fn request_n_passes_and_n_plus_one_is_rejected() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let policy = RateLimitPolicy {
            limit: 3,
            window: Duration::from_secs(60),
        };

        for i in 0..3 {
            let status = check_rate_limit(&store, policy, "GET:/api/todos", "1.2.3.4")
                .await
                .unwrap();
            assert_eq!(status.remaining, 2 - i);
        }

        let err = check_rate_limit(&store, policy, "GET:/api/todos", "1.2.3.4")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TooManyRequests { retry_after: 60 }));
    }

    #[tokio::test]
    async fn windows_are_per_identifier_and_action() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let policy = RateLimitPolicy {
            limit: 1,
            window: Duration::from_secs(60),
        };

        check_rate_limit(&store, policy, "GET:/a", "1.1.1.1").await.unwrap();
        assert!(check_rate_limit(&store, policy, "GET:/a", "1.1.1.1").await.is_err());

        // Different client and different route both unaffected
        check_rate_limit(&store, policy, "GET:/a", "2.2.2.2").await.unwrap();
        check_rate_limit(&store, policy, "GET:/b", "1.1.1.1").await.unwrap();
    }

    #[tokio::test]
    async fn window_expiry_resets_the_counter() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let policy = RateLimitPolicy {
            limit: 1,
            window: Duration::from_millis(10),
        };

        check_rate_limit(&store, policy, "GET:/a", "1.1.1.1").await.unwrap();
        assert!(check_rate_limit(&store, policy, "GET:/a", "1.1.1.1").await.is_err());

        tokio::time::sleep(Duration::from_millis(30)).await;
        check_rate_limit(&store, policy, "GET:/a", "1.1.1.1").await.unwrap();
    }
}
