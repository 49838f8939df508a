//! Lab booking endpoints.
//!
//! - `POST /api/lab-bookings`: patient requests a test
//! - `GET /api/lab-bookings`: patient or hospital/lab staff lists own
//! - `PUT /api/lab-bookings/:id/status`: confirm or mark collected
//! - `POST /api/lab-bookings/:id/complete`: multipart `report` + `doctor_id`

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::optional_datetime;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::enums::LabBookingStatus;
use crate::models::{LabBooking, NewLabBooking};
use crate::workflow::lab_bookings::{self, LabStatusChange};
use crate::workflow::reports::ReportUpload;

/// Upper bound for one uploaded report.
pub const MAX_REPORT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
pub struct LabBookingBody {
    pub booking: LabBooking,
}

#[derive(Serialize)]
pub struct LabBookingsBody {
    pub bookings: Vec<LabBooking>,
}

#[derive(Serialize)]
pub struct CompletedBody {
    pub booking: LabBooking,
    pub report_id: i64,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: LabBookingStatus,
    pub collection_date: Option<String>,
    pub report_eta: Option<String>,
}

/// `POST /api/lab-bookings`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<NewLabBooking>,
) -> Result<(StatusCode, Json<ApiResponse<LabBookingBody>>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let booking = lab_bookings::create(&mut conn, &identity, &request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Lab test booked successfully", LabBookingBody { booking })),
    ))
}

/// `GET /api/lab-bookings`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<LabBookingsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let bookings = lab_bookings::list(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Lab bookings fetched", LabBookingsBody { bookings })))
}

/// `PUT /api/lab-bookings/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ApiResponse<LabBookingBody>>, ApiError> {
    let change = LabStatusChange {
        status: request.status,
        collection_date: optional_datetime("collection_date", request.collection_date.as_deref())?,
        report_eta: optional_datetime("report_eta", request.report_eta.as_deref())?,
    };
    let mut conn = ctx.core.open_db()?;
    let booking = lab_bookings::update_status(&mut conn, id, &identity, &change)?;
    Ok(Json(ApiResponse::ok("Lab booking status updated", LabBookingBody { booking })))
}

/// `POST /api/lab-bookings/:id/complete`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<CompletedBody>>, ApiError> {
    let mut report: Option<(Option<String>, Option<String>, axum::body::Bytes)> = None;
    let mut doctor_id: Option<i64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("report") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                report = Some((file_name, content_type, data));
            }
            Some("doctor_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    doctor_id = Some(raw.parse().map_err(|_| {
                        ApiError::BadRequest(format!("Invalid doctor_id: {raw}"))
                    })?);
                }
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        report.ok_or_else(|| ApiError::BadRequest("Report file is required".into()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Report file is empty".into()));
    }
    let mime_type = resolve_mime(file_name.as_deref(), content_type.as_deref())?;
    let path = report_path(&ctx.core.config.upload_dir, file_name.as_deref(), &mime_type);

    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot store report {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), %mime_type, "Report stored");

    let upload = ReportUpload { path: path.clone(), mime_type };
    let outcome = ctx.core.open_db().map_err(ApiError::from).and_then(|mut conn| {
        lab_bookings::complete(&mut conn, id, &identity, &upload, doctor_id, ctx.core.analyzer())
            .map_err(ApiError::from)
    });

    match outcome {
        Ok(done) => Ok(Json(ApiResponse::ok(
            "Lab report uploaded and booking completed",
            CompletedBody { booking: done.booking, report_id: done.report_id },
        ))),
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Cannot remove orphaned report");
            }
            Err(err)
        }
    }
}

/// Reports are PDFs or images.
fn resolve_mime(file_name: Option<&str>, content_type: Option<&str>) -> Result<String, ApiError> {
    let mime = match content_type.filter(|c| !c.is_empty() && *c != "application/octet-stream") {
        Some(declared) => declared.to_ascii_lowercase(),
        None => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    };
    if mime == "application/pdf" || mime.starts_with("image/") {
        Ok(mime)
    } else {
        Err(ApiError::BadRequest(format!(
            "Unsupported report type {mime}; upload a PDF or an image"
        )))
    }
}

/// A fresh file name under `dir`, keeping a safe extension.
fn report_path(dir: &FsPath, file_name: Option<&str>, mime_type: &str) -> PathBuf {
    let from_name = file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    let ext = from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string());
    dir.join(format!("report-{}.{ext}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_header_or_name() {
        assert_eq!(resolve_mime(None, Some("application/pdf")).unwrap(), "application/pdf");
        assert_eq!(resolve_mime(Some("scan.PNG"), None).unwrap(), "image/png");
        assert_eq!(
            resolve_mime(Some("scan.jpg"), Some("application/octet-stream")).unwrap(),
            "image/jpeg"
        );
        assert!(resolve_mime(Some("notes.txt"), Some("text/plain")).is_err());
        assert!(resolve_mime(None, None).is_err());
    }

    #[test]
    fn report_path_keeps_safe_extension() {
        let dir = FsPath::new("/tmp/uploads");
        let path = report_path(dir, Some("CBC Report.PDF"), "application/pdf");
        assert!(path.starts_with(dir));
        assert_eq!(path.extension().unwrap(), "pdf");

        let path = report_path(dir, Some("../../etc/passwd"), "image/png");
        assert!(path.starts_with(dir));
        assert_eq!(path.extension().unwrap(), "png");
    }
}
