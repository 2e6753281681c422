//! Spreadsheet export.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::ReportService;
use crate::services::report::{build_report, report_filename, write_workbook};
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Download the six-sheet business report. Admins only.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn export(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Response> {
    let facts = ReportService::new(state.pool()).export_facts().await?;
    let generated_at = Utc::now();
    let report = build_report(facts, generated_at);

    let bytes = tokio::task::spawn_blocking(move || write_workbook(&report))
        .await
        .map_err(|e| AppError::Internal(format!("export task: {e}")))??;

    let filename = report_filename(generated_at);
    tracing::info!(%filename, size = bytes.len(), "Report exported");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
