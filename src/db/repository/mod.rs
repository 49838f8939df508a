//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table
//! family. Callers that need atomicity pass a `Transaction`, which derefs
//! to `Connection`.

mod actors;
mod appointment;
mod lab_booking;
mod lab_report;
mod medicine_booking;
mod notification;
mod prescription;

use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;

use super::sqlite::DB_DATETIME_FORMAT;
use super::DatabaseError;

pub use actors::*;
pub use appointment::*;
pub use lab_booking::*;
pub use lab_report::*;
pub use medicine_booking::*;
pub use notification::*;
pub use prescription::*;

/// Render a timestamp in the column format.
pub fn to_db_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DB_DATETIME_FORMAT).to_string()
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a TEXT column holding a `str_enum!` value.
pub(crate) fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DB_DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDateTime::parse_from_str(&raw, DB_DATETIME_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}
