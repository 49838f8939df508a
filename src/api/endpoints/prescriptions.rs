//! Prescription endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::{NewPrescription, Prescription};
use crate::workflow::prescriptions;

#[derive(Serialize)]
pub struct PrescriptionBody {
    pub prescription: Prescription,
}

#[derive(Serialize)]
pub struct PrescriptionsBody {
    pub prescriptions: Vec<Prescription>,
}

/// `POST /api/prescriptions`: doctor only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<NewPrescription>,
) -> Result<(StatusCode, Json<ApiResponse<PrescriptionBody>>), ApiError> {
    let conn = ctx.core.open_db()?;
    let prescription = prescriptions::create(&conn, &identity, &request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Prescription created", PrescriptionBody { prescription })),
    ))
}

/// `GET /api/prescriptions`: the patient's own.
pub async fn list_own(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<PrescriptionsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let prescriptions = prescriptions::list_own(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Prescriptions fetched", PrescriptionsBody { prescriptions })))
}

/// `GET /api/prescriptions/patient/:id`: doctor view of a patient.
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<i64>,
) -> Result<Json<ApiResponse<PrescriptionsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let prescriptions = prescriptions::list_for_patient(&conn, &identity, patient_id)?;
    Ok(Json(ApiResponse::ok("Prescriptions fetched", PrescriptionsBody { prescriptions })))
}
