use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{datetime_col, enum_col};
use crate::db::DatabaseError;
use crate::models::enums::{AvailabilityStatus, UserType};
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, age, phone, email, address) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient.name, patient.age, patient.phone, patient.email, patient.address],
    )?;
    Ok(conn.last_insert_rowid())
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        created_at: datetime_col(row, 6)?,
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, age, phone, email, address, created_at FROM patients WHERE id = ?1",
        params![id],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (name, specialization, hospital_name, phone, email, fees,
                              availability_status, license_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doctor.name,
            doctor.specialization,
            doctor.hospital_name,
            doctor.phone,
            doctor.email,
            doctor.fees,
            doctor.availability_status.as_str(),
            doctor.license_number,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const DOCTOR_COLUMNS: &str = "id, name, specialization, hospital_name, phone, email, fees,
     availability_status, license_number, is_verified, created_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        hospital_name: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        fees: row.get(6)?,
        availability_status: enum_col(row, 7)?,
        license_number: row.get(8)?,
        is_verified: row.get::<_, i32>(9)? != 0,
        created_at: datetime_col(row, 10)?,
    })
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    conn.query_row(&sql, params![id], doctor_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

/// Doctors currently taking bookings, by name.
pub fn list_available_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE availability_status = ?1 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![AvailabilityStatus::Available.as_str()], doctor_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn set_doctor_availability(
    conn: &Connection,
    doctor_id: i64,
    status: AvailabilityStatus,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET availability_status = ?1 WHERE id = ?2",
        params![status.as_str(), doctor_id],
    )?;
    Ok(changed == 1)
}

pub fn insert_hospital(conn: &Connection, hospital: &NewHospital) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO hospitals (hospital_name, email, address, phone, license_number)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            hospital.hospital_name,
            hospital.email,
            hospital.address,
            hospital.phone,
            hospital.license_number,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn hospital_from_row(row: &Row<'_>) -> rusqlite::Result<Hospital> {
    Ok(Hospital {
        id: row.get(0)?,
        hospital_name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        license_number: row.get(5)?,
        is_verified: row.get::<_, i32>(6)? != 0,
        created_at: datetime_col(row, 7)?,
    })
}

pub fn get_hospital(conn: &Connection, id: i64) -> Result<Option<Hospital>, DatabaseError> {
    conn.query_row(
        "SELECT id, hospital_name, email, address, phone, license_number, is_verified, created_at
         FROM hospitals WHERE id = ?1",
        params![id],
        hospital_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Hospitals double as labs for patients picking where to book a test.
pub fn list_hospitals(conn: &Connection) -> Result<Vec<Hospital>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, hospital_name, email, address, phone, license_number, is_verified, created_at
         FROM hospitals ORDER BY hospital_name",
    )?;
    let rows = stmt.query_map([], hospital_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_lab_staff(conn: &Connection, staff: &NewLabStaff) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO lab_staff (hospital_id, name, email, phone, license_number)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![staff.hospital_id, staff.name, staff.email, staff.phone, staff.license_number],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lab_staff(conn: &Connection, id: i64) -> Result<Option<LabStaff>, DatabaseError> {
    conn.query_row(
        "SELECT id, hospital_id, name, email, phone, license_number, is_verified, created_at
         FROM lab_staff WHERE id = ?1",
        params![id],
        |row| {
            Ok(LabStaff {
                id: row.get(0)?,
                hospital_id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                license_number: row.get(5)?,
                is_verified: row.get::<_, i32>(6)? != 0,
                created_at: datetime_col(row, 7)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn insert_medical_shop(conn: &Connection, shop: &NewMedicalShop) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_shops (shop_name, owner_name, email, phone, address, license_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            shop.shop_name,
            shop.owner_name,
            shop.email,
            shop.phone,
            shop.address,
            shop.license_number,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const SHOP_COLUMNS: &str =
    "id, shop_name, owner_name, email, phone, address, license_number, is_verified, created_at";

fn medical_shop_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalShop> {
    Ok(MedicalShop {
        id: row.get(0)?,
        shop_name: row.get(1)?,
        owner_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        license_number: row.get(6)?,
        is_verified: row.get::<_, i32>(7)? != 0,
        created_at: datetime_col(row, 8)?,
    })
}

pub fn get_medical_shop(conn: &Connection, id: i64) -> Result<Option<MedicalShop>, DatabaseError> {
    let sql = format!("SELECT {SHOP_COLUMNS} FROM medical_shops WHERE id = ?1");
    conn.query_row(&sql, params![id], medical_shop_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_medical_shops(conn: &Connection) -> Result<Vec<MedicalShop>, DatabaseError> {
    let sql = format!("SELECT {SHOP_COLUMNS} FROM medical_shops ORDER BY shop_name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], medical_shop_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_admin(conn: &Connection, username: &str) -> Result<i64, DatabaseError> {
    conn.execute("INSERT INTO admins (username) VALUES (?1)", params![username])?;
    Ok(conn.last_insert_rowid())
}

/// Actor tables an admin can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiableActor {
    Doctor,
    Hospital,
    LabStaff,
    MedicalShop,
}

impl VerifiableActor {
    fn table(self) -> &'static str {
        match self {
            Self::Doctor => "doctors",
            Self::Hospital => "hospitals",
            Self::LabStaff => "lab_staff",
            Self::MedicalShop => "medical_shops",
        }
    }
}

/// Flag an actor as verified. Returns `false` when no row matched.
pub fn set_verified(
    conn: &Connection,
    actor: VerifiableActor,
    id: i64,
) -> Result<bool, DatabaseError> {
    let sql = format!("UPDATE {} SET is_verified = 1 WHERE id = ?1", actor.table());
    let changed = conn.execute(&sql, params![id])?;
    Ok(changed == 1)
}

fn purge_inbox(conn: &Connection, kind: UserType, id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM notifications WHERE user_type = ?1 AND user_id = ?2",
        params![kind.as_str(), id],
    )?;
    Ok(())
}

/// Remove a patient; bookings, reports and prescriptions cascade.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 1 {
        purge_inbox(conn, UserType::Patient, id)?;
    }
    Ok(changed == 1)
}

pub fn delete_doctor(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?;
    if changed == 1 {
        purge_inbox(conn, UserType::Doctor, id)?;
    }
    Ok(changed == 1)
}

/// Remove a hospital; its lab staff and lab bookings cascade.
pub fn delete_hospital(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let staff_ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM lab_staff WHERE hospital_id = ?1")?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };
    let changed = conn.execute("DELETE FROM hospitals WHERE id = ?1", params![id])?;
    if changed == 1 {
        purge_inbox(conn, UserType::Hospital, id)?;
        for staff_id in staff_ids {
            purge_inbox(conn, UserType::LabStaff, staff_id)?;
        }
    }
    Ok(changed == 1)
}

pub fn delete_medical_shop(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM medical_shops WHERE id = ?1", params![id])?;
    if changed == 1 {
        purge_inbox(conn, UserType::Medical, id)?;
    }
    Ok(changed == 1)
}

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub patients: i64,
    pub doctors: i64,
    pub hospitals: i64,
    pub lab_staff: i64,
    pub medical_shops: i64,
    pub appointments: i64,
    pub lab_bookings: i64,
    pub medicine_bookings: i64,
}

pub fn dashboard_stats(conn: &Connection) -> Result<DashboardStats, DatabaseError> {
    let stats = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM patients),
                (SELECT COUNT(*) FROM doctors),
                (SELECT COUNT(*) FROM hospitals),
                (SELECT COUNT(*) FROM lab_staff),
                (SELECT COUNT(*) FROM medical_shops),
                (SELECT COUNT(*) FROM appointments),
                (SELECT COUNT(*) FROM lab_bookings),
                (SELECT COUNT(*) FROM medicine_bookings)",
        [],
        |row| {
            Ok(DashboardStats {
                patients: row.get(0)?,
                doctors: row.get(1)?,
                hospitals: row.get(2)?,
                lab_staff: row.get(3)?,
                medical_shops: row.get(4)?,
                appointments: row.get(5)?,
                lab_bookings: row.get(6)?,
                medicine_bookings: row.get(7)?,
            })
        },
    )?;
    Ok(stats)
}
