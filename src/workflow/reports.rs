//! Uploaded lab reports: the analysis hook and read access.
//!
//! A report is visible to its patient and to the doctor the lab linked it to.

use std::path::PathBuf;

use rusqlite::Connection;
use serde_json::{json, Value};

use super::WorkflowError;
use crate::auth::{AuthError, Identity};
use crate::db;
use crate::models::enums::ReportFileType;
use crate::models::LabReport;

/// A stored report file as handed over by the upload layer.
/// The core never reads the file contents.
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub path: PathBuf,
    pub mime_type: String,
}

impl ReportUpload {
    pub fn file_type(&self) -> ReportFileType {
        ReportFileType::from_mime(&self.mime_type)
    }
}

/// Produces the `analysis_result` stored beside a report.
pub trait ReportAnalyzer: Send + Sync {
    fn analyze(&self, upload: &ReportUpload) -> Value;
}

/// Stores a placeholder until a real analyzer is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingAnalyzer;

impl ReportAnalyzer for PendingAnalyzer {
    fn analyze(&self, _upload: &ReportUpload) -> Value {
        json!({ "summary": "Analysis pending" })
    }
}

/// Reports the caller may read, newest first.
pub fn list(conn: &Connection, identity: &Identity) -> Result<Vec<LabReport>, WorkflowError> {
    if let Some(patient_id) = identity.patient_id() {
        return Ok(db::list_lab_reports_for_patient(conn, patient_id)?);
    }
    if let Some(doctor_id) = identity.doctor_id() {
        return Ok(db::list_lab_reports_for_doctor(conn, doctor_id)?);
    }
    Err(AuthError::Forbidden { role: identity.role() }.into())
}

pub fn get(conn: &Connection, id: i64, identity: &Identity) -> Result<LabReport, WorkflowError> {
    let (patient_id, doctor_id) = (identity.patient_id(), identity.doctor_id());
    if patient_id.is_none() && doctor_id.is_none() {
        return Err(AuthError::Forbidden { role: identity.role() }.into());
    }
    db::get_lab_report(conn, id)?
        .filter(|r| Some(r.patient_id) == patient_id || (doctor_id.is_some() && r.doctor_id == doctor_id))
        .ok_or(WorkflowError::NotFoundOrUnauthorized("Lab report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Subject;
    use crate::db::NewLabReport;
    use crate::workflow::testing::{fixture, Fixture};

    fn stored_report(f: &Fixture, doctor_id: Option<i64>) -> i64 {
        db::insert_lab_report(&f.conn, &NewLabReport {
            patient_id: f.patient,
            doctor_id,
            uploaded_by_staff_id: Some(f.staff),
            report_type: Some("CBC".into()),
            file_path: "uploads/cbc.pdf".into(),
            file_type: ReportFileType::Pdf,
            analysis_result: json!({ "summary": "Analysis pending" }),
        })
        .unwrap()
    }

    #[test]
    fn file_type_follows_mime() {
        let pdf = ReportUpload { path: "r.pdf".into(), mime_type: "application/pdf".into() };
        let png = ReportUpload { path: "r.png".into(), mime_type: "image/png".into() };
        assert_eq!(pdf.file_type(), ReportFileType::Pdf);
        assert_eq!(png.file_type(), ReportFileType::Image);
    }

    #[test]
    fn pending_analyzer_placeholder() {
        let upload = ReportUpload { path: "r.pdf".into(), mime_type: "application/pdf".into() };
        assert_eq!(PendingAnalyzer.analyze(&upload)["summary"], "Analysis pending");
    }

    #[test]
    fn patient_and_linked_doctor_read_reports() {
        let f = fixture();
        let linked = stored_report(&f, Some(f.doctor));
        let unlinked = stored_report(&f, None);

        let patient = Identity::new(Subject::Patient { patient_id: f.patient });
        let ids: Vec<i64> = list(&f.conn, &patient).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![unlinked, linked]);
        assert_eq!(get(&f.conn, unlinked, &patient).unwrap().report_type.as_deref(), Some("CBC"));

        let doctor = Identity::new(Subject::Doctor { doctor_id: f.doctor });
        let ids: Vec<i64> = list(&f.conn, &doctor).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![linked]);
        assert!(get(&f.conn, linked, &doctor).is_ok());
        assert!(matches!(
            get(&f.conn, unlinked, &doctor),
            Err(WorkflowError::NotFoundOrUnauthorized(_))
        ));
    }

    #[test]
    fn strangers_cannot_read_reports() {
        let f = fixture();
        let id = stored_report(&f, Some(f.doctor));

        let other_patient = Identity::new(Subject::Patient { patient_id: f.patient + 5 });
        assert!(list(&f.conn, &other_patient).unwrap().is_empty());
        assert!(matches!(
            get(&f.conn, id, &other_patient),
            Err(WorkflowError::NotFoundOrUnauthorized(_))
        ));

        let shop = Identity::new(Subject::Medical { medical_id: f.shop });
        assert!(matches!(list(&f.conn, &shop), Err(WorkflowError::Forbidden(_))));
        assert!(matches!(get(&f.conn, id, &shop), Err(WorkflowError::Forbidden(_))));
    }
}
