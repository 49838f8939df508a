//! Doctor-written prescriptions.

use rusqlite::Connection;

use super::WorkflowError;
use crate::auth::{AuthError, Capability, Identity};
use crate::db;
use crate::models::{NewPrescription, Prescription};

fn acting_doctor(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Doctor)?;
    identity
        .doctor_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

pub fn create(
    conn: &Connection,
    identity: &Identity,
    request: &NewPrescription,
) -> Result<Prescription, WorkflowError> {
    let doctor_id = acting_doctor(identity)?;
    if request.prescription.trim().is_empty() {
        return Err(WorkflowError::Validation("prescription is required".into()));
    }
    if db::get_patient(conn, request.patient_id)?.is_none() {
        return Err(WorkflowError::NotFoundOrUnauthorized("Patient"));
    }

    let id = db::insert_prescription(conn, doctor_id, request)?;
    tracing::info!(prescription_id = id, doctor_id, patient_id = request.patient_id, "Prescription written");
    db::get_prescription(conn, id)?
        .ok_or_else(|| WorkflowError::Internal(format!("prescription {id} vanished")))
}

/// The caller's own prescriptions.
pub fn list_own(conn: &Connection, identity: &Identity) -> Result<Vec<Prescription>, WorkflowError> {
    identity.require(Capability::Patient)?;
    let patient_id = identity
        .patient_id()
        .ok_or(AuthError::Forbidden { role: identity.role() })?;
    Ok(db::list_prescriptions_for_patient(conn, patient_id)?)
}

/// A patient's history, as seen by a doctor.
pub fn list_for_patient(
    conn: &Connection,
    identity: &Identity,
    patient_id: i64,
) -> Result<Vec<Prescription>, WorkflowError> {
    acting_doctor(identity)?;
    if db::get_patient(conn, patient_id)?.is_none() {
        return Err(WorkflowError::NotFoundOrUnauthorized("Patient"));
    }
    Ok(db::list_prescriptions_for_patient(conn, patient_id)?)
}
