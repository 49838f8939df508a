//! API endpoint handlers.
//!
//! Each module covers one resource. Handlers open a connection, call into
//! `workflow` with the caller's `Identity` and wrap the result in
//! `ApiResponse`.

pub mod admin;
pub mod appointments;
pub mod directory;
pub mod health;
pub mod lab_bookings;
pub mod medicine_bookings;
pub mod notifications;
pub mod prescriptions;
pub mod reports;

use chrono::NaiveDateTime;

use crate::workflow::{parse_datetime, WorkflowError};

/// Parse an optional request timestamp; blank strings count as absent.
pub(crate) fn optional_datetime(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<NaiveDateTime>, WorkflowError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => parse_datetime(field, value).map(Some),
        _ => Ok(None),
    }
}
