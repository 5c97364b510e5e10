//! In-memory todo repository for tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use taskhub_db::{CreateTodo, DbError, DbResult, TodoFilter, TodoRepository, TodoRow, UpdateTodo};
use taskhub_types::TodoSort;

/// In-memory `TodoRepository`
#[derive(Default)]
pub struct MockTodoRepository {
    todos: Mutex<Vec<TodoRow>>,
}

impl MockTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many rows the repository holds (all users)
    pub fn row_count(&self) -> usize {
        self.todos.lock().unwrap().len()
    }
}

fn matches(row: &TodoRow, user_id: Uuid, filter: &TodoFilter) -> bool {
    row.user_id == user_id
        && filter.status.as_deref().is_none_or(|s| row.status == s)
        && filter
            .importance
            .as_deref()
            .is_none_or(|i| row.importance == i)
        && filter.urgency.is_none_or(|u| row.urgency == u)
}

fn sort_rows(rows: &mut [TodoRow], sort: TodoSort) {
    match sort {
        TodoSort::Priority => rows.sort_by(|a, b| {
            a.importance
                .cmp(&b.importance)
                .then(a.urgency.cmp(&b.urgency))
                .then(b.created_at.cmp(&a.created_at))
        }),
        TodoSort::CreatedAt => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TodoSort::DueDate => rows.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
}

#[async_trait]
impl TodoRepository for MockTodoRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TodoRow>> {
        Ok(self.todos.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, user_id: Uuid, filter: &TodoFilter) -> DbResult<(Vec<TodoRow>, i64)> {
        let todos = self.todos.lock().unwrap();
        let mut rows: Vec<TodoRow> = todos
            .iter()
            .filter(|t| matches(t, user_id, filter))
            .cloned()
            .collect();
        let total = rows.len() as i64;

        sort_rows(&mut rows, filter.sort);
        let offset = ((filter.page - 1) * filter.limit).max(0) as usize;
        let page: Vec<TodoRow> = rows
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn list_all(&self, user_id: Uuid) -> DbResult<Vec<TodoRow>> {
        let mut rows: Vec<TodoRow> = self
            .todos
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_recent(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<TodoRow>> {
        let mut rows = self.list_all(user_id).await?;
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn create(&self, todo: CreateTodo) -> DbResult<TodoRow> {
        let now = Utc::now();
        let row = TodoRow {
            id: todo.id,
            user_id: todo.user_id,
            title: todo.title,
            description: todo.description,
            importance: todo.importance,
            urgency: todo.urgency,
            status: "pending".to_string(),
            due_date: todo.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.todos.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, update: UpdateTodo) -> DbResult<TodoRow> {
        let mut todos = self.todos.lock().unwrap();
        let row = todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DbError::NotFound)?;

        if let Some(title) = update.title {
            row.title = title;
        }
        if let Some(description) = update.description {
            row.description = Some(description);
        }
        if let Some(importance) = update.importance {
            row.importance = importance;
        }
        if let Some(urgency) = update.urgency {
            row.urgency = urgency;
        }
        if let Some(status) = update.status {
            row.status = status;
        }
        if let Some(due_date) = update.due_date {
            row.due_date = Some(due_date);
        }
        if let Some(completed_at) = update.completed_at {
            row.completed_at = Some(completed_at);
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.todos.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}
