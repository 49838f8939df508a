//! Booking workflows.
//!
//! Every state-changing operation runs inside one `BEGIN IMMEDIATE`
//! transaction: the owner-scoped read, the adjacency check and the
//! compare-and-set update share the write lock. Notifications are written
//! after commit and never fail the operation.

pub mod appointments;
pub mod directory;
pub mod lab_bookings;
pub mod medicine_bookings;
pub mod messages;
pub mod notifications;
pub mod prescriptions;
pub mod reports;
pub mod transitions;

use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::auth::AuthError;
use crate::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found or unauthorized")]
    NotFoundOrUnauthorized(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for WorkflowError {
    fn from(err: DatabaseError) -> Self {
        WorkflowError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for WorkflowError {
    fn from(err: rusqlite::Error) -> Self {
        WorkflowError::Internal(err.to_string())
    }
}

impl From<AuthError> for WorkflowError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(reason) => WorkflowError::Unauthenticated(reason.to_string()),
            AuthError::Forbidden { .. } => WorkflowError::Forbidden(err.to_string()),
            AuthError::Signing(detail) => WorkflowError::Internal(detail),
        }
    }
}

/// Run `f` in a write-locking transaction. Commits on `Ok`, rolls back on `Err`.
pub(crate) fn in_immediate_tx<T, F>(conn: &mut Connection, f: F) -> Result<T, WorkflowError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, WorkflowError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Current wall-clock time, truncated to the column precision.
pub(crate) fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Accept `2026-03-02T17:30:00Z`, `2026-03-02T17:30:00`, `2026-03-02T17:30`
/// or `2026-03-02 17:30:00`.
pub fn parse_datetime(field: &str, raw: &str) -> Result<NaiveDateTime, WorkflowError> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| WorkflowError::Validation(format!("Invalid {field}: {raw}")))
}
