use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::MedicineBookingStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineBooking {
    pub id: i64,
    pub medical_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub phone: String,
    pub address: String,
    pub prescription_id: Option<i64>,
    pub report_id: Option<i64>,
    pub status: MedicineBookingStatus,
    pub delivery_date: Option<NaiveDateTime>,
    pub cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicineBooking {
    pub medical_id: i64,
    pub patient_name: String,
    pub phone: String,
    pub address: String,
    pub prescription_id: Option<i64>,
    pub report_id: Option<i64>,
    pub notes: Option<String>,
}
