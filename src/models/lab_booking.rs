use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::LabBookingStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabBooking {
    pub id: i64,
    pub lab_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub phone: String,
    pub address: String,
    pub test_type: String,
    pub status: LabBookingStatus,
    pub collection_date: Option<NaiveDateTime>,
    pub report_eta: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLabBooking {
    pub lab_id: i64,
    pub patient_name: String,
    pub phone: String,
    pub address: String,
    pub test_type: String,
}
