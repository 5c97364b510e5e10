//! PostgreSQL report repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ReportRow;
use crate::repo::{CreateReport, ReportRepository};

const REPORT_COLUMNS: &str =
    "id, user_id, title, content, statistics, pdf_key, pdf_url, created_at, updated_at";

/// PostgreSQL report repository
#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    /// Create a new report repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ReportRow>> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");
        let report = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<ReportRow>> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ReportRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create(&self, report: CreateReport) -> DbResult<ReportRow> {
        let query = format!(
            r#"
            INSERT INTO reports (id, user_id, title, content, statistics)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REPORT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(report.id)
            .bind(report.user_id)
            .bind(&report.title)
            .bind(&report.content)
            .bind(&report.statistics)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn set_pdf(&self, id: Uuid, pdf_key: &str, pdf_url: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE reports SET pdf_key = $1, pdf_url = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(pdf_key)
        .bind(pdf_url)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
