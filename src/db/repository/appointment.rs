use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{datetime_col, enum_col, opt_datetime_col, to_db_datetime};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, PaymentStatus};
use crate::models::Appointment;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, status, payment_status, payment_amount,
     meet_link, notes, meeting_time, created_at";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        status: enum_col(row, 3)?,
        payment_status: enum_col(row, 4)?,
        payment_amount: row.get(5)?,
        meet_link: row.get(6)?,
        notes: row.get(7)?,
        meeting_time: opt_datetime_col(row, 8)?,
        created_at: datetime_col(row, 9)?,
    })
}

pub fn insert_appointment(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    payment_amount: f64,
    notes: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, payment_amount, notes)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, doctor_id, payment_amount, notes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment_for_doctor(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1 AND doctor_id = ?2");
    conn.query_row(&sql, params![id, doctor_id], appointment_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn get_appointment_for_patient(
    conn: &Connection,
    id: i64,
    patient_id: i64,
) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1 AND patient_id = ?2");
    conn.query_row(&sql, params![id, patient_id], appointment_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id], appointment_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_appointments_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doctor_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id], appointment_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Compare-and-set the appointment status for its doctor.
/// Returns the number of rows changed (0 when id, owner or expected status miss).
pub fn set_appointment_status(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
    expected: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1
         WHERE id = ?2 AND doctor_id = ?3 AND status = ?4",
        params![next.as_str(), id, doctor_id, expected.as_str()],
    )?;
    Ok(changed)
}

/// Compare-and-set the payment dimension for the owning patient.
pub fn set_payment_status(
    conn: &Connection,
    id: i64,
    patient_id: i64,
    expected: PaymentStatus,
    next: PaymentStatus,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET payment_status = ?1
         WHERE id = ?2 AND patient_id = ?3 AND payment_status = ?4",
        params![next.as_str(), id, patient_id, expected.as_str()],
    )?;
    Ok(changed)
}

/// Store the meeting details the doctor supplied; omitted fields keep
/// their stored value. Only an appointment still in `expected` changes.
pub fn set_meeting_details(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
    expected: AppointmentStatus,
    meet_link: Option<&str>,
    notes: Option<&str>,
    meeting_time: Option<&NaiveDateTime>,
) -> Result<usize, DatabaseError> {
    let mut assignments: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(link) = meet_link {
        values.push(Value::Text(link.to_string()));
        assignments.push(format!("meet_link = ?{}", values.len()));
    }
    if let Some(notes) = notes {
        values.push(Value::Text(notes.to_string()));
        assignments.push(format!("notes = ?{}", values.len()));
    }
    if let Some(at) = meeting_time {
        values.push(Value::Text(to_db_datetime(at)));
        assignments.push(format!("meeting_time = ?{}", values.len()));
    }
    if assignments.is_empty() {
        return Ok(0);
    }

    let n = values.len();
    let sql = format!(
        "UPDATE appointments SET {} WHERE id = ?{} AND doctor_id = ?{} AND status = ?{}",
        assignments.join(", "),
        n + 1,
        n + 2,
        n + 3,
    );
    values.push(Value::Integer(id));
    values.push(Value::Integer(doctor_id));
    values.push(Value::Text(expected.as_str().to_string()));

    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed)
}
