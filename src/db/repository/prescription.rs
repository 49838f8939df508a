use rusqlite::{params, Connection, OptionalExtension, Row};

use super::datetime_col;
use crate::db::DatabaseError;
use crate::models::{NewPrescription, Prescription};

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        disease: row.get(3)?,
        prescription: row.get(4)?,
        notes: row.get(5)?,
        created_at: datetime_col(row, 6)?,
    })
}

pub fn insert_prescription(
    conn: &Connection,
    doctor_id: i64,
    new: &NewPrescription,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (patient_id, doctor_id, disease, prescription, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.patient_id, doctor_id, new.disease, new.prescription, new.notes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_prescription(conn: &Connection, id: i64) -> Result<Option<Prescription>, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, doctor_id, disease, prescription, notes, created_at
         FROM prescriptions WHERE id = ?1",
        params![id],
        prescription_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_prescriptions_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, disease, prescription, notes, created_at
         FROM prescriptions WHERE patient_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], prescription_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
