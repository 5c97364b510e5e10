//! PostgreSQL todo repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taskhub_types::TodoSort;

use crate::error::{DbError, DbResult};
use crate::models::TodoRow;
use crate::repo::{CreateTodo, TodoFilter, TodoRepository, UpdateTodo};

const TODO_COLUMNS: &str = "id, user_id, title, description, importance, urgency, status, \
     due_date, completed_at, created_at, updated_at";

const FILTER_CLAUSE: &str = "user_id = $1 \
     AND ($2::text IS NULL OR status = $2) \
     AND ($3::text IS NULL OR importance = $3) \
     AND ($4::smallint IS NULL OR urgency = $4)";

/// PostgreSQL todo repository
#[derive(Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
}

impl PgTodoRepository {
    /// Create a new todo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(sort: TodoSort) -> &'static str {
    match sort {
        // Importance A..D sorts lexicographically, urgency 1 first
        TodoSort::Priority => "importance ASC, urgency ASC, created_at DESC",
        TodoSort::CreatedAt => "created_at DESC",
        TodoSort::DueDate => "due_date ASC NULLS LAST",
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TodoRow>> {
        let query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1");
        let todo = sqlx::query_as::<_, TodoRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn list(&self, user_id: Uuid, filter: &TodoFilter) -> DbResult<(Vec<TodoRow>, i64)> {
        let page = filter.page.max(1);
        let limit = filter.limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let query = format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE {FILTER_CLAUSE} \
             ORDER BY {} LIMIT $5 OFFSET $6",
            order_clause(filter.sort)
        );
        let rows = sqlx::query_as::<_, TodoRow>(&query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(&filter.importance)
            .bind(filter.urgency)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM todos WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(&filter.importance)
            .bind(filter.urgency)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn list_all(&self, user_id: Uuid) -> DbResult<Vec<TodoRow>> {
        let query = format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, TodoRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_recent(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<TodoRow>> {
        let query = format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, TodoRow>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create(&self, todo: CreateTodo) -> DbResult<TodoRow> {
        let query = format!(
            r#"
            INSERT INTO todos (id, user_id, title, description, importance, urgency, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TODO_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(todo.id)
            .bind(todo.user_id)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(&todo.importance)
            .bind(todo.urgency)
            .bind(todo.due_date)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, update: UpdateTodo) -> DbResult<TodoRow> {
        let query = format!(
            r#"
            UPDATE todos
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                importance = COALESCE($3, importance),
                urgency = COALESCE($4, urgency),
                status = COALESCE($5, status),
                due_date = COALESCE($6, due_date),
                completed_at = COALESCE($7, completed_at),
                updated_at = NOW()
            WHERE id = $8
            RETURNING {TODO_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(&update.title)
            .bind(&update.description)
            .bind(&update.importance)
            .bind(update.urgency)
            .bind(&update.status)
            .bind(update.due_date)
            .bind(update.completed_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
