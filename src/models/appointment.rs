use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentStatus, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_amount: Option<f64>,
    pub meet_link: Option<String>,
    pub notes: Option<String>,
    pub meeting_time: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
