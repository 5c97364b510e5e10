//! Todo service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use taskhub_cache::{keys, Store};
use taskhub_db::{CreateTodo, TodoFilter, TodoRepository, UpdateTodo};
use taskhub_types::{
    urgency_is_valid, Importance, Todo, TodoId, TodoSort, TodoStats, TodoStatus, UserId,
};

use crate::TodoError;

/// How long computed statistics stay cached
const STATS_CACHE_TTL: Duration = Duration::from_secs(300);
/// How many todos the statistics payload quotes back
const RECENT_COUNT: usize = 10;
/// History sample handed to the AI analysis
const HISTORY_LIMIT: i64 = 100;

const MAX_TITLE_LENGTH: usize = 200;

/// Create todo input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_importance")]
    pub importance: Importance,
    #[serde(default = "default_urgency")]
    pub urgency: i16,
    pub due_date: Option<DateTime<Utc>>,
}

fn default_importance() -> Importance {
    Importance::C
}

fn default_urgency() -> i16 {
    3
}

/// Partial update input; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub importance: Option<Importance>,
    pub urgency: Option<i16>,
    pub status: Option<TodoStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// List query: filters, sort and paging
#[derive(Debug, Clone, Deserialize)]
pub struct TodoQuery {
    pub status: Option<TodoStatus>,
    pub importance: Option<Importance>,
    pub urgency: Option<i16>,
    #[serde(default)]
    pub sort: TodoSort,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl Default for TodoQuery {
    fn default() -> Self {
        Self {
            status: None,
            importance: None,
            urgency: None,
            sort: TodoSort::Priority,
            page: 1,
            limit: 20,
        }
    }
}

/// One page of a todo listing
#[derive(Debug, Clone, Serialize)]
pub struct TodoListPage {
    pub items: Vec<Todo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Statistics payload: the aggregate counts plus recent todos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoStatsReport {
    #[serde(flatten)]
    pub stats: TodoStats,
    pub recent_todos: Vec<Todo>,
}

/// Todo service
pub struct TodoService<T: TodoRepository> {
    todos: Arc<T>,
    store: Arc<dyn Store>,
}

impl<T: TodoRepository> TodoService<T> {
    /// Create a new todo service
    pub fn new(todos: Arc<T>, store: Arc<dyn Store>) -> Self {
        Self { todos, store }
    }

    /// Create a todo
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create(&self, user_id: UserId, input: CreateTodoInput) -> Result<Todo, TodoError> {
        validate_title(&input.title)?;
        validate_urgency(input.urgency)?;

        let row = self
            .todos
            .create(CreateTodo {
                id: TodoId::new().0,
                user_id: user_id.0,
                title: input.title,
                description: input.description,
                importance: input.importance.to_string(),
                urgency: input.urgency,
                due_date: input.due_date,
            })
            .await?;

        self.invalidate_stats(user_id).await;
        Ok(Todo::try_from(row)?)
    }

    /// List todos with filters and paging
    pub async fn list(&self, user_id: UserId, query: TodoQuery) -> Result<TodoListPage, TodoError> {
        if let Some(urgency) = query.urgency {
            validate_urgency(urgency)?;
        }

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let filter = TodoFilter {
            status: query.status.map(|s| s.to_string()),
            importance: query.importance.map(|i| i.to_string()),
            urgency: query.urgency,
            sort: query.sort,
            page,
            limit,
        };

        let (rows, total) = self.todos.list(user_id.0, &filter).await?;
        let items = rows
            .into_iter()
            .map(Todo::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TodoListPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Fetch one todo, checking ownership
    pub async fn get(&self, user_id: UserId, todo_id: TodoId) -> Result<Todo, TodoError> {
        let row = self
            .todos
            .find_by_id(todo_id.0)
            .await?
            .ok_or(TodoError::NotFound)?;
        if row.user_id != user_id.0 {
            return Err(TodoError::Forbidden);
        }
        Ok(Todo::try_from(row)?)
    }

    /// Apply a partial update; completing a todo stamps `completed_at`
    #[instrument(skip(self, input), fields(user_id = %user_id, todo_id = %todo_id))]
    pub async fn update(
        &self,
        user_id: UserId,
        todo_id: TodoId,
        input: UpdateTodoInput,
    ) -> Result<Todo, TodoError> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }
        if let Some(urgency) = input.urgency {
            validate_urgency(urgency)?;
        }

        let current = self.get(user_id, todo_id).await?;

        // Stamp completion time on the transition into completed, once
        let completed_at = match input.status {
            Some(TodoStatus::Completed) if current.status != TodoStatus::Completed => {
                Some(Utc::now())
            }
            _ => None,
        };

        let row = self
            .todos
            .update(
                todo_id.0,
                UpdateTodo {
                    title: input.title,
                    description: input.description,
                    importance: input.importance.map(|i| i.to_string()),
                    urgency: input.urgency,
                    status: input.status.map(|s| s.to_string()),
                    due_date: input.due_date,
                    completed_at,
                },
            )
            .await?;

        self.invalidate_stats(user_id).await;
        Ok(Todo::try_from(row)?)
    }

    /// Delete a todo
    #[instrument(skip(self), fields(user_id = %user_id, todo_id = %todo_id))]
    pub async fn delete(&self, user_id: UserId, todo_id: TodoId) -> Result<(), TodoError> {
        self.get(user_id, todo_id).await?;
        self.todos.delete(todo_id.0).await?;
        self.invalidate_stats(user_id).await;
        Ok(())
    }

    /// Statistics over all the user's todos, cached for a few minutes.
    /// Cache trouble degrades to recomputation, never to an error.
    pub async fn statistics(&self, user_id: UserId) -> Result<TodoStatsReport, TodoError> {
        let cache_key = keys::todo_stats(&user_id.to_string());

        match self.store.get(&cache_key).await {
            Ok(Some(cached)) => {
                if let Ok(report) = serde_json::from_str::<TodoStatsReport>(&cached) {
                    return Ok(report);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Stats cache read failed"),
        }

        let rows = self.todos.list_all(user_id.0).await?;
        let todos = rows
            .into_iter()
            .map(Todo::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let report = TodoStatsReport {
            stats: TodoStats::from_todos(&todos),
            recent_todos: todos.into_iter().take(RECENT_COUNT).collect(),
        };

        if let Ok(serialized) = serde_json::to_string(&report) {
            if let Err(e) = self.store.set(&cache_key, &serialized, STATS_CACHE_TTL).await {
                warn!(error = %e, "Stats cache write failed");
            }
        }

        Ok(report)
    }

    /// Recent history sample for the AI analysis
    pub async fn history_for_analysis(&self, user_id: UserId) -> Result<Vec<Todo>, TodoError> {
        let rows = self.todos.list_recent(user_id.0, HISTORY_LIMIT).await?;
        Ok(rows
            .into_iter()
            .map(Todo::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn invalidate_stats(&self, user_id: UserId) {
        let cache_key = keys::todo_stats(&user_id.to_string());
        if let Err(e) = self.store.del(&cache_key).await {
            warn!(error = %e, "Stats cache invalidation failed");
        }
    }
}

impl<T: TodoRepository> std::fmt::Debug for TodoService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService").finish_non_exhaustive()
    }
}

fn validate_title(title: &str) -> Result<(), TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TodoError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_urgency(urgency: i16) -> Result<(), TodoError> {
    if !urgency_is_valid(urgency) {
        return Err(TodoError::Validation(
            "urgency must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}
