use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{datetime_col, enum_col};
use crate::db::DatabaseError;
use crate::models::enums::ReportFileType;
use crate::models::LabReport;

#[derive(Debug, Clone)]
pub struct NewLabReport {
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub uploaded_by_staff_id: Option<i64>,
    pub report_type: Option<String>,
    pub file_path: String,
    pub file_type: ReportFileType,
    pub analysis_result: serde_json::Value,
}

const REPORT_COLUMNS: &str = "id, patient_id, doctor_id, uploaded_by_staff_id, report_type, file_path,
     file_type, analysis_result, uploaded_at";

fn lab_report_from_row(row: &Row<'_>) -> rusqlite::Result<LabReport> {
    let analysis: String = row.get(7)?;
    Ok(LabReport {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        uploaded_by_staff_id: row.get(3)?,
        report_type: row.get(4)?,
        file_path: row.get(5)?,
        file_type: enum_col(row, 6)?,
        analysis_result: serde_json::from_str(&analysis).unwrap_or(serde_json::Value::Null),
        uploaded_at: datetime_col(row, 8)?,
    })
}

pub fn insert_lab_report(conn: &Connection, report: &NewLabReport) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO lab_reports (patient_id, doctor_id, uploaded_by_staff_id, report_type,
                                  file_path, file_type, analysis_result)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            report.patient_id,
            report.doctor_id,
            report.uploaded_by_staff_id,
            report.report_type,
            report.file_path,
            report.file_type.as_str(),
            report.analysis_result.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lab_report(conn: &Connection, id: i64) -> Result<Option<LabReport>, DatabaseError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM lab_reports WHERE id = ?1");
    conn.query_row(&sql, params![id], lab_report_from_row)
        .optional()
        .map_err(DatabaseError::from)
}

/// A patient's reports, newest first.
pub fn list_lab_reports_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<LabReport>, DatabaseError> {
    list_reports_where(conn, "patient_id", patient_id)
}

/// Reports a lab linked to this doctor, newest first.
pub fn list_lab_reports_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<LabReport>, DatabaseError> {
    list_reports_where(conn, "doctor_id", doctor_id)
}

fn list_reports_where(conn: &Connection, column: &str, id: i64) -> Result<Vec<LabReport>, DatabaseError> {
    let sql = format!(
        "SELECT {REPORT_COLUMNS} FROM lab_reports WHERE {column} = ?1
         ORDER BY uploaded_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id], lab_report_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
