//! Report handlers

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhub_types::{Report, ReportId};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    pub content: String,
    pub statistics: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<Report>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePdfResponse {
    pub pdf_url: String,
}

/// POST /api/reports
///
/// Creates the report and kicks off PDF generation in the background.
pub async fn create_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    if req.title.trim().is_empty() {
        return Err(crate::error::ApiError::BadRequest(
            "title must not be empty".to_string(),
        ));
    }

    let report = state
        .reports
        .create(auth_user.user_id, req.title, req.content, req.statistics)
        .await?;
    metrics::counter!("reports_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/reports
pub async fn list_reports(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<ReportsResponse>> {
    let reports = state.reports.list(auth_user.user_id).await?;
    Ok(Json(ReportsResponse { reports }))
}

/// GET /api/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Report>> {
    let report = state.reports.get(auth_user.user_id, ReportId(id)).await?;
    Ok(Json(report))
}

/// DELETE /api/reports/{id}
pub async fn delete_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.reports.delete(auth_user.user_id, ReportId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/reports/{id}/pdf
///
/// Redirects to object storage when the PDF was uploaded, otherwise
/// renders on the fly and streams the bytes.
pub async fn download_pdf(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let report = state.reports.get(auth_user.user_id, ReportId(id)).await?;

    if let Some(url) = &report.pdf_url {
        return Ok(Redirect::temporary(url).into_response());
    }

    let bytes = state.reports.render_pdf(&report)?;
    let disposition = format!("attachment; filename=\"report-{}.pdf\"", report.id);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/reports/{id}/generate-pdf
///
/// Synchronous render-and-upload; returns the stored URL.
pub async fn generate_pdf(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GeneratePdfResponse>> {
    let report = state.reports.get(auth_user.user_id, ReportId(id)).await?;
    let pdf_url = state.reports.generate_pdf(&report).await?;
    metrics::counter!("report_pdfs_generated_total").increment(1);
    Ok(Json(GeneratePdfResponse { pdf_url }))
}
