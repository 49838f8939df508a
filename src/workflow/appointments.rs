//! Appointment booking, doctor decisions, meeting details and payment.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;

use super::notifications::emit;
use super::transitions::{check, APPOINTMENT_DOCTOR_MOVES};
use super::{in_immediate_tx, messages, WorkflowError};
use crate::auth::{AuthError, Capability, Identity};
use crate::db;
use crate::models::enums::{AppointmentStatus, AvailabilityStatus, PaymentStatus};
use crate::models::{Appointment, Recipient};

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointment {
    pub doctor_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MeetingDetails {
    pub meet_link: Option<String>,
    pub notes: Option<String>,
    pub meeting_time: Option<NaiveDateTime>,
}

fn require_patient(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Patient)?;
    identity
        .patient_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

fn require_doctor(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Doctor)?;
    identity
        .doctor_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

/// Book with an available doctor; the fee is taken from the doctor's profile.
pub fn book(
    conn: &mut Connection,
    identity: &Identity,
    request: &BookAppointment,
) -> Result<Appointment, WorkflowError> {
    let patient_id = require_patient(identity)?;

    let appointment = in_immediate_tx(conn, |tx| {
        let doctor = db::get_doctor(tx, request.doctor_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Doctor"))?;
        if doctor.availability_status != AvailabilityStatus::Available {
            return Err(WorkflowError::Validation(
                "Doctor is not available for appointments".into(),
            ));
        }
        let id = db::insert_appointment(
            tx,
            patient_id,
            doctor.id,
            doctor.fees,
            request.notes.as_deref(),
        )?;
        db::get_appointment_for_patient(tx, id, patient_id)?
            .ok_or_else(|| WorkflowError::Internal(format!("appointment {id} vanished")))
    })?;

    tracing::info!(appointment_id = appointment.id, patient_id, doctor_id = appointment.doctor_id, "Appointment booked");
    emit(
        conn,
        Recipient::doctor(appointment.doctor_id),
        &messages::appointment_requested(patient_id),
    );
    Ok(appointment)
}

/// Doctor toggles whether new bookings are accepted.
pub fn set_availability(
    conn: &Connection,
    identity: &Identity,
    status: AvailabilityStatus,
) -> Result<(), WorkflowError> {
    let doctor_id = require_doctor(identity)?;
    if !db::set_doctor_availability(conn, doctor_id, status)? {
        return Err(WorkflowError::NotFoundOrUnauthorized("Doctor"));
    }
    tracing::info!(doctor_id, availability = %status, "Doctor availability changed");
    Ok(())
}

/// Appointments visible to a patient or doctor, newest first.
pub fn list(conn: &Connection, identity: &Identity) -> Result<Vec<Appointment>, WorkflowError> {
    if let Some(patient_id) = identity.patient_id() {
        Ok(db::list_appointments_for_patient(conn, patient_id)?)
    } else if let Some(doctor_id) = identity.doctor_id() {
        Ok(db::list_appointments_for_doctor(conn, doctor_id)?)
    } else {
        Err(AuthError::Forbidden { role: identity.role() }.into())
    }
}

/// Move a pending appointment to `accepted` or `rejected`.
pub fn decide(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    next: AppointmentStatus,
) -> Result<Appointment, WorkflowError> {
    let doctor_id = require_doctor(identity)?;

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_appointment_for_doctor(tx, id, doctor_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Appointment"))?;
        check("appointment", APPOINTMENT_DOCTOR_MOVES, current.status, next)?;
        if db::set_appointment_status(tx, id, doctor_id, current.status, next)? == 0 {
            return Err(WorkflowError::Conflict("Appointment changed concurrently".into()));
        }
        Ok(Appointment { status: next, ..current })
    })?;

    tracing::info!(appointment_id = id, doctor_id, status = %next, "Appointment decided");
    let message = match next {
        AppointmentStatus::Accepted => messages::appointment_accepted(),
        _ => messages::appointment_rejected(),
    };
    emit(conn, Recipient::patient(updated.patient_id), &message);
    Ok(updated)
}

pub fn accept(conn: &mut Connection, id: i64, identity: &Identity) -> Result<Appointment, WorkflowError> {
    decide(conn, id, identity, AppointmentStatus::Accepted)
}

pub fn reject(conn: &mut Connection, id: i64, identity: &Identity) -> Result<Appointment, WorkflowError> {
    decide(conn, id, identity, AppointmentStatus::Rejected)
}

/// Attach a meeting link, notes or time to an accepted appointment.
/// Fields left out keep their stored value.
pub fn share_details(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    details: &MeetingDetails,
) -> Result<Appointment, WorkflowError> {
    let doctor_id = require_doctor(identity)?;
    if details.meet_link.is_none() && details.notes.is_none() && details.meeting_time.is_none() {
        return Err(WorkflowError::Validation(
            "Provide at least one of meet_link, notes or meeting_time".into(),
        ));
    }

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_appointment_for_doctor(tx, id, doctor_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Appointment"))?;
        if current.status != AppointmentStatus::Accepted {
            return Err(WorkflowError::Conflict(format!(
                "Cannot share meeting details for a {} appointment",
                current.status
            )));
        }
        let changed = db::set_meeting_details(
            tx,
            id,
            doctor_id,
            AppointmentStatus::Accepted,
            details.meet_link.as_deref(),
            details.notes.as_deref(),
            details.meeting_time.as_ref(),
        )?;
        if changed == 0 {
            return Err(WorkflowError::Conflict("Appointment changed concurrently".into()));
        }
        Ok(Appointment {
            meet_link: details.meet_link.clone().or(current.meet_link.clone()),
            notes: details.notes.clone().or(current.notes.clone()),
            meeting_time: details.meeting_time.or(current.meeting_time),
            ..current
        })
    })?;

    tracing::info!(appointment_id = id, doctor_id, "Meeting details shared");
    emit(
        conn,
        Recipient::patient(updated.patient_id),
        &messages::meeting_details_shared(updated.meeting_time.as_ref()),
    );
    Ok(updated)
}

/// Mark the appointment paid. Paying twice is a conflict.
pub fn pay(conn: &mut Connection, id: i64, identity: &Identity) -> Result<Appointment, WorkflowError> {
    let patient_id = require_patient(identity)?;

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_appointment_for_patient(tx, id, patient_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Appointment"))?;
        if current.payment_status != PaymentStatus::Pending
            || db::set_payment_status(tx, id, patient_id, PaymentStatus::Pending, PaymentStatus::Completed)? == 0
        {
            return Err(WorkflowError::Conflict("Appointment is already paid".into()));
        }
        Ok(Appointment { payment_status: PaymentStatus::Completed, ..current })
    })?;

    tracing::info!(appointment_id = id, patient_id, "Appointment paid");
    Ok(updated)
}
