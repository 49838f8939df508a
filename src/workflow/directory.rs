//! Where patients find a lab, a medical shop or a doctor to book with.

use rusqlite::Connection;

use super::WorkflowError;
use crate::auth::{Capability, Identity};
use crate::db;
use crate::models::{Doctor, Hospital, MedicalShop};

/// Hospitals run the labs that take test bookings.
pub fn labs(conn: &Connection, identity: &Identity) -> Result<Vec<Hospital>, WorkflowError> {
    identity.require(Capability::Any)?;
    Ok(db::list_hospitals(conn)?)
}

pub fn medical_shops(conn: &Connection, identity: &Identity) -> Result<Vec<MedicalShop>, WorkflowError> {
    identity.require(Capability::Any)?;
    Ok(db::list_medical_shops(conn)?)
}

/// Only doctors currently accepting appointments.
pub fn available_doctors(conn: &Connection, identity: &Identity) -> Result<Vec<Doctor>, WorkflowError> {
    identity.require(Capability::Any)?;
    Ok(db::list_available_doctors(conn)?)
}
