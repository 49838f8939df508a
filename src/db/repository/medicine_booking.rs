use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{datetime_col, enum_col, opt_datetime_col, to_db_datetime};
use crate::db::DatabaseError;
use crate::models::enums::MedicineBookingStatus;
use crate::models::{MedicineBooking, NewMedicineBooking};

const MEDICINE_BOOKING_COLUMNS: &str = "id, medical_id, patient_id, patient_name, phone, address,
     prescription_id, report_id, status, delivery_date, cost, notes, created_at";

/// Which side of a medicine order is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicineOwner {
    Shop(i64),
    Patient(i64),
}

impl MedicineOwner {
    fn column(self) -> (&'static str, i64) {
        match self {
            Self::Shop(id) => ("medical_id", id),
            Self::Patient(id) => ("patient_id", id),
        }
    }
}

/// Fields changed by one status update. `None` leaves the column as is.
#[derive(Debug, Clone)]
pub struct MedicineBookingUpdate {
    pub status: MedicineBookingStatus,
    pub delivery_date: Option<NaiveDateTime>,
    pub cost: Option<f64>,
}

impl MedicineBookingUpdate {
    pub fn status_only(status: MedicineBookingStatus) -> Self {
        Self {
            status,
            delivery_date: None,
            cost: None,
        }
    }
}

fn medicine_booking_from_row(row: &Row<'_>) -> rusqlite::Result<MedicineBooking> {
    Ok(MedicineBooking {
        id: row.get(0)?,
        medical_id: row.get(1)?,
        patient_id: row.get(2)?,
        patient_name: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        prescription_id: row.get(6)?,
        report_id: row.get(7)?,
        status: enum_col(row, 8)?,
        delivery_date: opt_datetime_col(row, 9)?,
        cost: row.get(10)?,
        notes: row.get(11)?,
        created_at: datetime_col(row, 12)?,
    })
}

pub fn insert_medicine_booking(
    conn: &Connection,
    patient_id: i64,
    new: &NewMedicineBooking,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medicine_bookings (medical_id, patient_id, patient_name, phone, address,
                                        prescription_id, report_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.medical_id,
            patient_id,
            new.patient_name,
            new.phone,
            new.address,
            new.prescription_id,
            new.report_id,
            new.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn get_scoped(
    conn: &Connection,
    id: i64,
    owner: MedicineOwner,
) -> Result<Option<MedicineBooking>, DatabaseError> {
    let (column, owner_id) = owner.column();
    let sql = format!("SELECT {MEDICINE_BOOKING_COLUMNS} FROM medicine_bookings WHERE id = ?1 AND {column} = ?2");
    conn.query_row(&sql, params![id, owner_id], medicine_booking_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn get_medicine_booking_for_shop(
    conn: &Connection,
    id: i64,
    medical_id: i64,
) -> Result<Option<MedicineBooking>, DatabaseError> {
    get_scoped(conn, id, MedicineOwner::Shop(medical_id))
}

pub fn get_medicine_booking_for_patient(
    conn: &Connection,
    id: i64,
    patient_id: i64,
) -> Result<Option<MedicineBooking>, DatabaseError> {
    get_scoped(conn, id, MedicineOwner::Patient(patient_id))
}

pub fn list_medicine_bookings(
    conn: &Connection,
    owner: MedicineOwner,
) -> Result<Vec<MedicineBooking>, DatabaseError> {
    let (column, owner_id) = owner.column();
    let sql = format!(
        "SELECT {MEDICINE_BOOKING_COLUMNS} FROM medicine_bookings WHERE {column} = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], medicine_booking_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Compare-and-set a medicine order, writing only the supplied optional fields.
/// Scoped by id, the acting owner and the expected current status.
pub fn update_medicine_booking(
    conn: &Connection,
    id: i64,
    owner: MedicineOwner,
    expected: MedicineBookingStatus,
    update: &MedicineBookingUpdate,
) -> Result<usize, DatabaseError> {
    let mut assignments = vec!["status = ?1".to_string()];
    let mut values: Vec<Value> = vec![Value::Text(update.status.as_str().to_string())];

    if let Some(date) = &update.delivery_date {
        values.push(Value::Text(to_db_datetime(date)));
        assignments.push(format!("delivery_date = ?{}", values.len()));
    }
    if let Some(cost) = update.cost {
        values.push(Value::Real(cost));
        assignments.push(format!("cost = ?{}", values.len()));
    }

    let (column, owner_id) = owner.column();
    let n = values.len();
    let sql = format!(
        "UPDATE medicine_bookings SET {} WHERE id = ?{} AND {column} = ?{} AND status = ?{}",
        assignments.join(", "),
        n + 1,
        n + 2,
        n + 3,
    );
    values.push(Value::Integer(id));
    values.push(Value::Integer(owner_id));
    values.push(Value::Text(expected.as_str().to_string()));

    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed)
}
