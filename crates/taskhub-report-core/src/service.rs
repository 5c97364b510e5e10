//! Report service

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

use taskhub_db::{CreateReport, ReportRepository};
use taskhub_types::{Report, ReportId, UserId};

use crate::{
    pdf::PdfRenderer,
    storage::{report_pdf_key, ObjectStorage},
    ReportError,
};

/// Report service
///
/// CRUD over a user's reports plus PDF rendering. On creation the
/// render-and-upload runs as a detached task; `generate_pdf` offers the
/// same work synchronously for the explicit endpoint.
pub struct ReportService<R: ReportRepository> {
    reports: Arc<R>,
    renderer: PdfRenderer,
    storage: Option<Arc<ObjectStorage>>,
}

impl<R: ReportRepository + 'static> ReportService<R> {
    /// Create a new report service
    pub fn new(reports: Arc<R>, storage: Option<Arc<ObjectStorage>>) -> Self {
        Self {
            reports,
            renderer: PdfRenderer::new(),
            storage,
        }
    }

    /// Create a report and kick off detached PDF generation
    #[instrument(skip(self, content, statistics), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: UserId,
        title: String,
        content: String,
        statistics: Option<serde_json::Value>,
    ) -> Result<Report, ReportError> {
        let row = self
            .reports
            .create(CreateReport {
                id: ReportId::new().0,
                user_id: user_id.0,
                title,
                content,
                statistics,
            })
            .await?;
        let report = Report::from(row);

        // Fire and forget; the client gets its report either way and the
        // PDF URL shows up once the task finishes
        if self.storage.is_some() {
            self.spawn_pdf_generation(report.clone());
        }

        Ok(report)
    }

    /// All reports for a user, newest first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Report>, ReportError> {
        let rows = self.reports.list_by_user(user_id.0).await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }

    /// Fetch a report, checking ownership
    pub async fn get(&self, user_id: UserId, report_id: ReportId) -> Result<Report, ReportError> {
        let row = self
            .reports
            .find_by_id(report_id.0)
            .await?
            .ok_or(ReportError::NotFound)?;
        if row.user_id != user_id.0 {
            return Err(ReportError::Forbidden);
        }
        Ok(Report::from(row))
    }

    /// Delete a report and best-effort remove its stored PDF
    #[instrument(skip(self), fields(user_id = %user_id, report_id = %report_id))]
    pub async fn delete(&self, user_id: UserId, report_id: ReportId) -> Result<(), ReportError> {
        let report = self.get(user_id, report_id).await?;
        self.reports.delete(report_id.0).await?;

        if let (Some(storage), Some(key)) = (&self.storage, &report.pdf_key) {
            if let Err(e) = storage.delete(key).await {
                error!(key, error = %e, "Failed to delete report PDF from storage");
            }
        }

        Ok(())
    }

    /// Render a report to PDF bytes without touching storage
    pub fn render_pdf(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
        self.renderer.render(report)
    }

    /// Render, upload and persist the PDF location. Returns the URL.
    #[instrument(skip(self, report), fields(report_id = %report.id))]
    pub async fn generate_pdf(&self, report: &Report) -> Result<String, ReportError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or(ReportError::StorageNotConfigured)?;

        let bytes = self.renderer.render(report)?;
        let key = report_pdf_key(report.user_id, report.id, Utc::now());
        let url = storage.upload(&key, bytes, "application/pdf").await?;
        self.reports.set_pdf(report.id.0, &key, &url).await?;

        info!(report_id = %report.id, url = %url, "Report PDF generated");
        Ok(url)
    }

    fn spawn_pdf_generation(&self, report: Report) {
        let reports = Arc::clone(&self.reports);
        let storage = self.storage.clone();
        let renderer = self.renderer.clone();

        tokio::spawn(async move {
            let Some(storage) = storage else { return };

            let bytes = match renderer.render(&report) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(report_id = %report.id, error = %e, "Detached PDF render failed");
                    return;
                }
            };

            let key = report_pdf_key(report.user_id, report.id, Utc::now());
            let url = match storage.upload(&key, bytes, "application/pdf").await {
                Ok(url) => url,
                Err(e) => {
                    error!(report_id = %report.id, error = %e, "Detached PDF upload failed");
                    return;
                }
            };

            if let Err(e) = reports.set_pdf(report.id.0, &key, &url).await {
                error!(report_id = %report.id, error = %e, "Failed to record PDF location");
            }
        });
    }
}

impl<R: ReportRepository> std::fmt::Debug for ReportService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("storage_configured", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}
