use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{datetime_col, enum_col, opt_datetime_col, to_db_datetime};
use crate::db::DatabaseError;
use crate::models::enums::LabBookingStatus;
use crate::models::{LabBooking, NewLabBooking};

const LAB_BOOKING_COLUMNS: &str = "id, lab_id, patient_id, patient_name, phone, address, test_type,
     status, collection_date, report_eta, created_at";

/// Fields a lab may change in one status update. `None` leaves the column as is.
#[derive(Debug, Clone)]
pub struct LabBookingUpdate {
    pub status: LabBookingStatus,
    pub collection_date: Option<NaiveDateTime>,
    pub report_eta: Option<NaiveDateTime>,
}

fn lab_booking_from_row(row: &Row<'_>) -> rusqlite::Result<LabBooking> {
    Ok(LabBooking {
        id: row.get(0)?,
        lab_id: row.get(1)?,
        patient_id: row.get(2)?,
        patient_name: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        test_type: row.get(6)?,
        status: enum_col(row, 7)?,
        collection_date: opt_datetime_col(row, 8)?,
        report_eta: opt_datetime_col(row, 9)?,
        created_at: datetime_col(row, 10)?,
    })
}

pub fn insert_lab_booking(
    conn: &Connection,
    patient_id: i64,
    new: &NewLabBooking,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO lab_bookings (lab_id, patient_id, patient_name, phone, address, test_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![new.lab_id, patient_id, new.patient_name, new.phone, new.address, new.test_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lab_booking_for_lab(
    conn: &Connection,
    id: i64,
    lab_id: i64,
) -> Result<Option<LabBooking>, DatabaseError> {
    let sql = format!("SELECT {LAB_BOOKING_COLUMNS} FROM lab_bookings WHERE id = ?1 AND lab_id = ?2");
    conn.query_row(&sql, params![id, lab_id], lab_booking_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_lab_bookings_for_lab(
    conn: &Connection,
    lab_id: i64,
) -> Result<Vec<LabBooking>, DatabaseError> {
    let sql = format!(
        "SELECT {LAB_BOOKING_COLUMNS} FROM lab_bookings WHERE lab_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![lab_id], lab_booking_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_lab_bookings_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<LabBooking>, DatabaseError> {
    let sql = format!(
        "SELECT {LAB_BOOKING_COLUMNS} FROM lab_bookings WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id], lab_booking_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Compare-and-set a lab booking, writing only the supplied optional fields.
/// Scoped by id, owning lab and the expected current status.
pub fn update_lab_booking(
    conn: &Connection,
    id: i64,
    lab_id: i64,
    expected: LabBookingStatus,
    update: &LabBookingUpdate,
) -> Result<usize, DatabaseError> {
    let mut assignments = vec!["status = ?1".to_string()];
    let mut values: Vec<Value> = vec![Value::Text(update.status.as_str().to_string())];

    if let Some(date) = &update.collection_date {
        values.push(Value::Text(to_db_datetime(date)));
        assignments.push(format!("collection_date = ?{}", values.len()));
    }
    if let Some(eta) = &update.report_eta {
        values.push(Value::Text(to_db_datetime(eta)));
        assignments.push(format!("report_eta = ?{}", values.len()));
    }

    let n = values.len();
    let sql = format!(
        "UPDATE lab_bookings SET {} WHERE id = ?{} AND lab_id = ?{} AND status = ?{}",
        assignments.join(", "),
        n + 1,
        n + 2,
        n + 3,
    );
    values.push(Value::Integer(id));
    values.push(Value::Integer(lab_id));
    values.push(Value::Text(expected.as_str().to_string()));

    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed)
}
