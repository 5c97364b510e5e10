//! AI analysis handler

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use taskhub_ai::{build_analysis_prompt, EMPTY_HISTORY_MESSAGE};
use taskhub_cache::keys;
use taskhub_types::TodoStats;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// How long a computed analysis is served from cache
const ANALYSIS_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub cached: bool,
}

/// GET /api/ai/analyze
///
/// Pro-only: analyzes the user's todo history with the LLM (or the mock
/// fallback) and caches the result for a few minutes.
pub async fn analyze(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<AnalysisResponse>> {
    let user = state.auth.current_user(auth_user.user_id).await?;
    if !user.is_pro(Utc::now()) {
        return Err(ApiError::Forbidden(
            "AI analysis is a Pro feature; upgrade to use it".to_string(),
        ));
    }

    let cache_key = keys::ai_analysis(&auth_user.user_id.to_string());
    if let Ok(Some(cached)) = state.store.get(&cache_key).await {
        return Ok(Json(AnalysisResponse {
            analysis: cached,
            cached: true,
        }));
    }

    let todos = state.todos.history_for_analysis(auth_user.user_id).await?;
    if todos.is_empty() {
        return Ok(Json(AnalysisResponse {
            analysis: EMPTY_HISTORY_MESSAGE.to_string(),
            cached: false,
        }));
    }

    let stats = TodoStats::from_todos(&todos);
    let prompt = build_analysis_prompt(&todos, &stats);
    let analysis = state.ai.analyze(&prompt).await;

    metrics::counter!("ai_analyses_total").increment(1);

    if let Err(e) = state
        .store
        .set(&cache_key, &analysis, ANALYSIS_CACHE_TTL)
        .await
    {
        tracing::warn!(error = %e, "Failed to cache AI analysis");
    }

    Ok(Json(AnalysisResponse {
        analysis,
        cached: false,
    }))
}
