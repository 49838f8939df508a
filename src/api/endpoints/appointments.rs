//! Appointment endpoints.
//!
//! - `POST /api/appointments`: patient books
//! - `GET /api/appointments`: patient or doctor lists own
//! - `PUT /api/appointments/:id/{accept,reject,share-details}`: doctor
//! - `POST /api/appointments/:id/payment`: patient pays
//! - `PUT /api/doctors/availability`: doctor toggles availability

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::optional_datetime;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::enums::AvailabilityStatus;
use crate::models::Appointment;
use crate::workflow::appointments::{self, BookAppointment, MeetingDetails};

#[derive(Serialize)]
pub struct AppointmentBody {
    pub appointment: Appointment,
}

#[derive(Serialize)]
pub struct AppointmentsBody {
    pub appointments: Vec<Appointment>,
}

#[derive(Deserialize)]
pub struct ShareDetailsRequest {
    pub meet_link: Option<String>,
    pub notes: Option<String>,
    pub meeting_time: Option<String>,
}

#[derive(Serialize)]
pub struct AvailabilityBody {
    pub availability_status: AvailabilityStatus,
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub availability_status: AvailabilityStatus,
}

/// `POST /api/appointments`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<BookAppointment>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentBody>>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let appointment = appointments::book(&mut conn, &identity, &request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Appointment booked successfully", AppointmentBody { appointment })),
    ))
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<AppointmentsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let appointments = appointments::list(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Appointments fetched", AppointmentsBody { appointments })))
}

/// `PUT /api/appointments/:id/accept`
pub async fn accept(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    let mut conn = ctx.core.open_db()?;
    let appointment = appointments::accept(&mut conn, id, &identity)?;
    Ok(Json(ApiResponse::ok("Appointment accepted", AppointmentBody { appointment })))
}

/// `PUT /api/appointments/:id/reject`
pub async fn reject(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    let mut conn = ctx.core.open_db()?;
    let appointment = appointments::reject(&mut conn, id, &identity)?;
    Ok(Json(ApiResponse::ok("Appointment rejected", AppointmentBody { appointment })))
}

/// `PUT /api/appointments/:id/share-details`
pub async fn share_details(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(request): Json<ShareDetailsRequest>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    let details = MeetingDetails {
        meet_link: request.meet_link,
        notes: request.notes,
        meeting_time: optional_datetime("meeting_time", request.meeting_time.as_deref())?,
    };
    let mut conn = ctx.core.open_db()?;
    let appointment = appointments::share_details(&mut conn, id, &identity, &details)?;
    Ok(Json(ApiResponse::ok("Meeting details shared", AppointmentBody { appointment })))
}

/// `POST /api/appointments/:id/payment`
pub async fn pay(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    let mut conn = ctx.core.open_db()?;
    let appointment = appointments::pay(&mut conn, id, &identity)?;
    Ok(Json(ApiResponse::ok("Payment completed", AppointmentBody { appointment })))
}

/// `PUT /api/doctors/availability`
pub async fn set_availability(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<ApiResponse<AvailabilityBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    appointments::set_availability(&conn, &identity, request.availability_status)?;
    Ok(Json(ApiResponse::ok(
        "Availability updated",
        AvailabilityBody { availability_status: request.availability_status },
    )))
}
