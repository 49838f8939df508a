//! Booking targets: labs, medical shops and available doctors.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::{Doctor, Hospital, MedicalShop};
use crate::workflow::directory;

#[derive(Serialize)]
pub struct LabsBody {
    pub labs: Vec<Hospital>,
}

#[derive(Serialize)]
pub struct ShopsBody {
    pub medical_shops: Vec<MedicalShop>,
}

#[derive(Serialize)]
pub struct DoctorsBody {
    pub doctors: Vec<Doctor>,
}

/// `GET /api/labs`
pub async fn labs(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<LabsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let labs = directory::labs(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Labs fetched", LabsBody { labs })))
}

/// `GET /api/medical-shops`
pub async fn medical_shops(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<ShopsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let medical_shops = directory::medical_shops(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Medical shops fetched", ShopsBody { medical_shops })))
}

/// `GET /api/doctors`: available doctors only.
pub async fn doctors(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<DoctorsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctors = directory::available_doctors(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Doctors fetched", DoctorsBody { doctors })))
}
