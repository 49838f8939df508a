use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AvailabilityStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub hospital_name: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub fees: f64,
    pub availability_status: AvailabilityStatus,
    pub license_number: Option<String>,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub hospital_name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabStaff {
    pub id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalShop {
    pub id: i64,
    pub shop_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
}

/// Insert payloads; ids and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: Option<i64>,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
    pub hospital_name: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub fees: f64,
    pub availability_status: AvailabilityStatus,
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHospital {
    pub hospital_name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLabStaff {
    pub hospital_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMedicalShop {
    pub shop_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
}
