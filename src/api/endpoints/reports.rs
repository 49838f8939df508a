//! Lab report reads for the patient and the linked doctor.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::LabReport;
use crate::workflow::reports;

#[derive(Serialize)]
pub struct ReportBody {
    pub report: LabReport,
}

#[derive(Serialize)]
pub struct ReportsBody {
    pub reports: Vec<LabReport>,
}

/// `GET /api/reports`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<ReportsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let reports = reports::list(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Reports fetched", ReportsBody { reports })))
}

/// `GET /api/reports/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let report = reports::get(&conn, id, &identity)?;
    Ok(Json(ApiResponse::ok("Report fetched", ReportBody { report })))
}
