use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{datetime_col, enum_col};
use crate::db::DatabaseError;
use crate::models::{Notification, Recipient};

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_type: enum_col(row, 1)?,
        user_id: row.get(2)?,
        message: row.get(3)?,
        is_read: row.get::<_, i32>(4)? != 0,
        created_at: datetime_col(row, 5)?,
    })
}

pub fn insert_notification(
    conn: &Connection,
    to: Recipient,
    message: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (user_type, user_id, message) VALUES (?1, ?2, ?3)",
        params![to.kind.as_str(), to.id, message],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_notification(conn: &Connection, id: i64) -> Result<Option<Notification>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_type, user_id, message, is_read, created_at
         FROM notifications WHERE id = ?1",
        params![id],
        notification_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Newest first. Rows written in the same second fall back to insertion order.
pub fn list_notifications(
    conn: &Connection,
    inbox: Recipient,
    limit: u32,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_type, user_id, message, is_read, created_at
         FROM notifications WHERE user_type = ?1 AND user_id = ?2
         ORDER BY created_at DESC, id DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(
        params![inbox.kind.as_str(), inbox.id, limit],
        notification_from_row,
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_unread_notifications(conn: &Connection, inbox: Recipient) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications
         WHERE user_type = ?1 AND user_id = ?2 AND is_read = 0",
        params![inbox.kind.as_str(), inbox.id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Flag a notification in `inbox` as read. Returns the number of matching
/// rows, so an already-read notification still reports 1.
pub fn mark_notification_read(
    conn: &Connection,
    id: i64,
    inbox: Recipient,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1
         WHERE id = ?1 AND user_type = ?2 AND user_id = ?3",
        params![id, inbox.kind.as_str(), inbox.id],
    )?;
    Ok(changed)
}
