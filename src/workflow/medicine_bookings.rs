//! Medicine orders between a patient and a medical shop.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use super::notifications::emit;
use super::transitions::{check, is_terminal_medicine, MEDICINE_PATIENT_MOVES, MEDICINE_SHOP_MOVES};
use super::{in_immediate_tx, messages, now, WorkflowError};
use crate::auth::{AuthError, Capability, Identity};
use crate::db::{self, MedicineBookingUpdate, MedicineOwner};
use crate::models::enums::{DeliveryResponse, MedicineBookingStatus};
use crate::models::{MedicineBooking, NewMedicineBooking, Recipient};

/// Shop-side status change with optional delivery details.
#[derive(Debug, Clone)]
pub struct MedicineStatusChange {
    pub status: MedicineBookingStatus,
    pub delivery_date: Option<NaiveDateTime>,
    pub cost: Option<f64>,
}

fn acting_shop(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Facility)?;
    identity
        .medical_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

fn acting_patient(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Patient)?;
    identity
        .patient_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

fn ensure_open(current: &MedicineBooking) -> Result<(), WorkflowError> {
    if is_terminal_medicine(current.status) {
        return Err(WorkflowError::Conflict(format!(
            "Medicine booking is already {}",
            current.status
        )));
    }
    Ok(())
}

pub fn create(
    conn: &mut Connection,
    identity: &Identity,
    request: &NewMedicineBooking,
) -> Result<MedicineBooking, WorkflowError> {
    let patient_id = acting_patient(identity)?;
    for (field, value) in [
        ("patient_name", &request.patient_name),
        ("phone", &request.phone),
        ("address", &request.address),
    ] {
        if value.trim().is_empty() {
            return Err(WorkflowError::Validation(format!("{field} is required")));
        }
    }

    let booking = in_immediate_tx(conn, |tx| {
        if db::get_medical_shop(tx, request.medical_id)?.is_none() {
            return Err(WorkflowError::NotFoundOrUnauthorized("Medical shop"));
        }
        if let Some(prescription_id) = request.prescription_id {
            match db::get_prescription(tx, prescription_id)? {
                Some(p) if p.patient_id == patient_id => {}
                _ => return Err(WorkflowError::Validation(format!("Unknown prescription {prescription_id}"))),
            }
        }
        if let Some(report_id) = request.report_id {
            match db::get_lab_report(tx, report_id)? {
                Some(r) if r.patient_id == patient_id => {}
                _ => return Err(WorkflowError::Validation(format!("Unknown report {report_id}"))),
            }
        }
        let id = db::insert_medicine_booking(tx, patient_id, request)?;
        db::get_medicine_booking_for_patient(tx, id, patient_id)?
            .ok_or_else(|| WorkflowError::Internal(format!("medicine booking {id} vanished")))
    })?;

    tracing::info!(medicine_booking_id = booking.id, patient_id, medical_id = booking.medical_id, "Medicine booking created");
    emit(
        conn,
        Recipient::medical(booking.medical_id),
        &messages::medicine_booked_for_shop(&booking.patient_name),
    );
    emit(
        conn,
        Recipient::patient(patient_id),
        &messages::medicine_booked_for_patient(&(now() + Duration::days(1))),
    );
    Ok(booking)
}

pub fn list(conn: &Connection, identity: &Identity) -> Result<Vec<MedicineBooking>, WorkflowError> {
    if let Some(patient_id) = identity.patient_id() {
        return Ok(db::list_medicine_bookings(conn, MedicineOwner::Patient(patient_id))?);
    }
    let medical_id = acting_shop(identity)?;
    Ok(db::list_medicine_bookings(conn, MedicineOwner::Shop(medical_id))?)
}

/// Shop moves: accept or reject a pending order, then dispatch and deliver.
pub fn update_status(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    change: &MedicineStatusChange,
) -> Result<MedicineBooking, WorkflowError> {
    let medical_id = acting_shop(identity)?;
    if let Some(cost) = change.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(WorkflowError::Validation(format!("Invalid cost: {cost}")));
        }
    }
    let owner = MedicineOwner::Shop(medical_id);

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_medicine_booking_for_shop(tx, id, medical_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Medicine booking"))?;
        ensure_open(&current)?;
        check("medicine booking", MEDICINE_SHOP_MOVES, current.status, change.status)?;
        let update = MedicineBookingUpdate {
            status: change.status,
            delivery_date: change.delivery_date,
            cost: change.cost,
        };
        if db::update_medicine_booking(tx, id, owner, current.status, &update)? == 0 {
            return Err(WorkflowError::Conflict("Medicine booking changed concurrently".into()));
        }
        Ok(MedicineBooking {
            status: change.status,
            delivery_date: change.delivery_date.or(current.delivery_date),
            cost: change.cost.or(current.cost),
            ..current
        })
    })?;

    tracing::info!(medicine_booking_id = id, medical_id, status = %updated.status, "Medicine booking status updated");
    emit(
        conn,
        Recipient::patient(updated.patient_id),
        &messages::medicine_status_changed(
            updated.id,
            updated.status,
            updated.cost,
            updated.delivery_date.as_ref(),
        ),
    );
    Ok(updated)
}

/// Patient answer to an accepted order's cost and delivery date.
pub fn respond(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    response: DeliveryResponse,
) -> Result<MedicineBooking, WorkflowError> {
    let patient_id = acting_patient(identity)?;
    let next = match response {
        DeliveryResponse::Accept => MedicineBookingStatus::Confirmed,
        DeliveryResponse::Reject => MedicineBookingStatus::Rejected,
    };

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_medicine_booking_for_patient(tx, id, patient_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Medicine booking"))?;
        ensure_open(&current)?;
        check("medicine booking", MEDICINE_PATIENT_MOVES, current.status, next)?;
        let update = MedicineBookingUpdate::status_only(next);
        if db::update_medicine_booking(tx, id, MedicineOwner::Patient(patient_id), current.status, &update)? == 0 {
            return Err(WorkflowError::Conflict("Medicine booking changed concurrently".into()));
        }
        Ok(MedicineBooking { status: next, ..current })
    })?;

    tracing::info!(medicine_booking_id = id, patient_id, status = %next, "Delivery response recorded");
    emit(
        conn,
        Recipient::medical(updated.medical_id),
        &messages::delivery_response(id, response),
    );
    Ok(updated)
}
