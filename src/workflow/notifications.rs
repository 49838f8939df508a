//! Notification emitter and inbox.

use rusqlite::Connection;

use super::WorkflowError;
use crate::auth::{AuthError, Identity};
use crate::db;
use crate::models::{Notification, Recipient};

/// Maximum notifications returned by one inbox read.
pub const INBOX_LIMIT: u32 = 20;

/// Write one notification. Failures are logged and swallowed; the return
/// value only says whether the row landed.
pub fn emit(conn: &Connection, to: Recipient, message: &str) -> bool {
    match db::insert_notification(conn, to, message) {
        Ok(id) => {
            tracing::debug!(notification_id = id, user_type = %to.kind, user_id = to.id, "Notification written");
            true
        }
        Err(e) => {
            tracing::warn!(user_type = %to.kind, user_id = to.id, error = %e, "Notification write failed");
            false
        }
    }
}

fn inbox_of(identity: &Identity) -> Result<Recipient, WorkflowError> {
    identity
        .inbox()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

/// Newest first, at most `INBOX_LIMIT`.
pub fn list(conn: &Connection, identity: &Identity) -> Result<Vec<Notification>, WorkflowError> {
    let inbox = inbox_of(identity)?;
    Ok(db::list_notifications(conn, inbox, INBOX_LIMIT)?)
}

pub fn unread_count(conn: &Connection, identity: &Identity) -> Result<i64, WorkflowError> {
    let inbox = inbox_of(identity)?;
    Ok(db::count_unread_notifications(conn, inbox)?)
}

/// Idempotent. A notification outside the caller's inbox is reported as missing.
pub fn mark_read(conn: &Connection, id: i64, identity: &Identity) -> Result<(), WorkflowError> {
    let inbox = inbox_of(identity)?;
    match db::mark_notification_read(conn, id, inbox)? {
        0 => Err(WorkflowError::NotFoundOrUnauthorized("Notification")),
        _ => Ok(()),
    }
}
