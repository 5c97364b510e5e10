//! Todo handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use taskhub_todo_core::{
    CreateTodoInput, TodoListPage, TodoQuery, TodoStatsReport, UpdateTodoInput,
};
use taskhub_types::{Todo, TodoId};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub items: Vec<Todo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl From<TodoListPage> for TodoListResponse {
    fn from(page: TodoListPage) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

/// POST /api/todos
pub async fn create_todo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateTodoInput>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let todo = state.todos.create(auth_user.user_id, input).await?;
    metrics::counter!("todos_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(todo)))
}

/// GET /api/todos
pub async fn list_todos(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<TodoQuery>,
) -> ApiResult<Json<TodoListResponse>> {
    let page = state.todos.list(auth_user.user_id, query).await?;
    Ok(Json(page.into()))
}

/// GET /api/todos/stats
pub async fn todo_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<TodoStatsReport>> {
    let report = state.todos.statistics(auth_user.user_id).await?;
    Ok(Json(report))
}

/// GET /api/todos/{id}
pub async fn get_todo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Todo>> {
    let todo = state.todos.get(auth_user.user_id, TodoId(id)).await?;
    Ok(Json(todo))
}

/// PATCH /api/todos/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodoInput>,
) -> ApiResult<Json<Todo>> {
    let todo = state
        .todos
        .update(auth_user.user_id, TodoId(id), input)
        .await?;
    Ok(Json(todo))
}

/// DELETE /api/todos/{id}
pub async fn delete_todo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.todos.delete(auth_user.user_id, TodoId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
