//! Medicine order endpoints.
//!
//! - `POST /api/medicine-bookings`: patient orders
//! - `GET /api/medicine-bookings`: patient or shop lists own
//! - `PUT /api/medicine-bookings/:id/status`: shop moves the order
//! - `PUT /api/medicine-bookings/:id/respond`: patient accepts or rejects the quote

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::optional_datetime;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::enums::{DeliveryResponse, MedicineBookingStatus};
use crate::models::{MedicineBooking, NewMedicineBooking};
use crate::workflow::medicine_bookings::{self, MedicineStatusChange};

#[derive(Serialize)]
pub struct MedicineBookingBody {
    pub booking: MedicineBooking,
}

#[derive(Serialize)]
pub struct MedicineBookingsBody {
    pub bookings: Vec<MedicineBooking>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: MedicineBookingStatus,
    pub delivery_date: Option<String>,
    pub cost: Option<f64>,
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub action: DeliveryResponse,
}

/// `POST /api/medicine-bookings`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<NewMedicineBooking>,
) -> Result<(StatusCode, Json<ApiResponse<MedicineBookingBody>>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let booking = medicine_bookings::create(&mut conn, &identity, &request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Medicine booked successfully", MedicineBookingBody { booking })),
    ))
}

/// `GET /api/medicine-bookings`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<MedicineBookingsBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let bookings = medicine_bookings::list(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Medicine bookings fetched", MedicineBookingsBody { bookings })))
}

/// `PUT /api/medicine-bookings/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ApiResponse<MedicineBookingBody>>, ApiError> {
    let change = MedicineStatusChange {
        status: request.status,
        delivery_date: optional_datetime("delivery_date", request.delivery_date.as_deref())?,
        cost: request.cost,
    };
    let mut conn = ctx.core.open_db()?;
    let booking = medicine_bookings::update_status(&mut conn, id, &identity, &change)?;
    Ok(Json(ApiResponse::ok("Medicine booking status updated", MedicineBookingBody { booking })))
}

/// `PUT /api/medicine-bookings/:id/respond`
pub async fn respond(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(request): Json<RespondRequest>,
) -> Result<Json<ApiResponse<MedicineBookingBody>>, ApiError> {
    let mut conn = ctx.core.open_db()?;
    let booking = medicine_bookings::respond(&mut conn, id, &identity, request.action)?;
    let message = match request.action {
        DeliveryResponse::Accept => "Delivery confirmed",
        DeliveryResponse::Reject => "Order rejected",
    };
    Ok(Json(ApiResponse::ok(message, MedicineBookingBody { booking })))
}
