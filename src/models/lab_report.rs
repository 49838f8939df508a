use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ReportFileType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabReport {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub uploaded_by_staff_id: Option<i64>,
    pub report_type: Option<String>,
    pub file_path: String,
    pub file_type: ReportFileType,
    pub analysis_result: serde_json::Value,
    pub uploaded_at: NaiveDateTime,
}
