//! Lab bookings: patient requests, hospital-side progress and report upload.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use super::notifications::emit;
use super::reports::{ReportAnalyzer, ReportUpload};
use super::transitions::{check, LAB_COMPLETION_MOVES, LAB_STATUS_MOVES};
use super::{in_immediate_tx, messages, now, WorkflowError};
use crate::auth::{AuthError, Capability, Identity};
use crate::db::{self, LabBookingUpdate, NewLabReport};
use crate::models::enums::LabBookingStatus;
use crate::models::{LabBooking, NewLabBooking, Recipient};

/// Requested change from the hospital side.
#[derive(Debug, Clone)]
pub struct LabStatusChange {
    pub status: LabBookingStatus,
    pub collection_date: Option<NaiveDateTime>,
    pub report_eta: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedLabBooking {
    pub booking: LabBooking,
    pub report_id: i64,
}

/// The hospital a facility caller acts for. Medical shops have none.
fn acting_lab(identity: &Identity) -> Result<i64, WorkflowError> {
    identity.require(Capability::Facility)?;
    identity
        .lab_id()
        .ok_or_else(|| AuthError::Forbidden { role: identity.role() }.into())
}

fn require_text(field: &str, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        Err(WorkflowError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub fn create(
    conn: &mut Connection,
    identity: &Identity,
    request: &NewLabBooking,
) -> Result<LabBooking, WorkflowError> {
    identity.require(Capability::Patient)?;
    let patient_id = identity
        .patient_id()
        .ok_or(AuthError::Forbidden { role: identity.role() })?;
    require_text("patient_name", &request.patient_name)?;
    require_text("phone", &request.phone)?;
    require_text("address", &request.address)?;
    require_text("test_type", &request.test_type)?;

    let booking = in_immediate_tx(conn, |tx| {
        if db::get_hospital(tx, request.lab_id)?.is_none() {
            return Err(WorkflowError::NotFoundOrUnauthorized("Lab"));
        }
        let id = db::insert_lab_booking(tx, patient_id, request)?;
        db::get_lab_booking_for_lab(tx, id, request.lab_id)?
            .ok_or_else(|| WorkflowError::Internal(format!("lab booking {id} vanished")))
    })?;

    tracing::info!(lab_booking_id = booking.id, patient_id, lab_id = booking.lab_id, "Lab booking created");
    emit(
        conn,
        Recipient::hospital(booking.lab_id),
        &messages::lab_booking_requested(&booking.patient_name, &booking.test_type),
    );
    Ok(booking)
}

pub fn list(conn: &Connection, identity: &Identity) -> Result<Vec<LabBooking>, WorkflowError> {
    if let Some(patient_id) = identity.patient_id() {
        return Ok(db::list_lab_bookings_for_patient(conn, patient_id)?);
    }
    let lab_id = acting_lab(identity)?;
    Ok(db::list_lab_bookings_for_lab(conn, lab_id)?)
}

/// Move a booking to `confirmed` or `collected`. Completion goes through [`complete`].
pub fn update_status(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    change: &LabStatusChange,
) -> Result<LabBooking, WorkflowError> {
    let lab_id = acting_lab(identity)?;
    if change.status == LabBookingStatus::Completed {
        return Err(WorkflowError::Validation(
            "A report file is required to complete a lab booking".into(),
        ));
    }

    let updated = in_immediate_tx(conn, |tx| {
        let current = db::get_lab_booking_for_lab(tx, id, lab_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Lab booking"))?;
        check("lab booking", LAB_STATUS_MOVES, current.status, change.status)?;
        let update = LabBookingUpdate {
            status: change.status,
            collection_date: change.collection_date,
            report_eta: change.report_eta,
        };
        if db::update_lab_booking(tx, id, lab_id, current.status, &update)? == 0 {
            return Err(WorkflowError::Conflict("Lab booking changed concurrently".into()));
        }
        Ok(LabBooking {
            status: change.status,
            collection_date: change.collection_date.or(current.collection_date),
            report_eta: change.report_eta.or(current.report_eta),
            ..current
        })
    })?;

    tracing::info!(lab_booking_id = id, lab_id, status = %updated.status, "Lab booking status updated");
    emit(
        conn,
        Recipient::patient(updated.patient_id),
        &messages::lab_status_changed(updated.status),
    );
    Ok(updated)
}

/// Attach the report, mark the booking completed and stamp `report_eta`, atomically.
pub fn complete(
    conn: &mut Connection,
    id: i64,
    identity: &Identity,
    upload: &ReportUpload,
    doctor_id: Option<i64>,
    analyzer: &dyn ReportAnalyzer,
) -> Result<CompletedLabBooking, WorkflowError> {
    let lab_id = acting_lab(identity)?;
    let file_path = upload
        .path
        .to_str()
        .ok_or_else(|| WorkflowError::Validation("Report path is not valid UTF-8".into()))?
        .to_string();

    let completed = in_immediate_tx(conn, |tx| {
        let current = db::get_lab_booking_for_lab(tx, id, lab_id)?
            .ok_or(WorkflowError::NotFoundOrUnauthorized("Lab booking"))?;
        check("lab booking", LAB_COMPLETION_MOVES, current.status, LabBookingStatus::Completed)?;
        if let Some(doctor_id) = doctor_id {
            if db::get_doctor(tx, doctor_id)?.is_none() {
                return Err(WorkflowError::Validation(format!("Unknown doctor {doctor_id}")));
            }
        }

        let report_id = db::insert_lab_report(tx, &NewLabReport {
            patient_id: current.patient_id,
            doctor_id,
            uploaded_by_staff_id: identity.staff_id(),
            report_type: Some(current.test_type.clone()),
            file_path: file_path.clone(),
            file_type: upload.file_type(),
            analysis_result: analyzer.analyze(upload),
        })?;

        let stamped = now();
        let update = LabBookingUpdate {
            status: LabBookingStatus::Completed,
            collection_date: None,
            report_eta: Some(stamped),
        };
        if db::update_lab_booking(tx, id, lab_id, current.status, &update)? == 0 {
            return Err(WorkflowError::Conflict("Lab booking changed concurrently".into()));
        }
        Ok(CompletedLabBooking {
            booking: LabBooking {
                status: LabBookingStatus::Completed,
                report_eta: Some(stamped),
                ..current
            },
            report_id,
        })
    })?;

    let booking = &completed.booking;
    tracing::info!(lab_booking_id = id, lab_id, report_id = completed.report_id, "Lab booking completed");
    emit(
        conn,
        Recipient::patient(booking.patient_id),
        &messages::lab_report_ready(&booking.test_type),
    );
    if let Some(doctor_id) = doctor_id {
        emit(
            conn,
            Recipient::doctor(doctor_id),
            &messages::lab_report_for_doctor(&booking.patient_name, booking.patient_id),
        );
    }
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Subject;
    use crate::models::enums::ReportFileType;
    use crate::workflow::parse_datetime;
    use crate::workflow::reports::PendingAnalyzer;
    use crate::workflow::testing::{fixture, Fixture};

    fn patient(f: &Fixture) -> Identity {
        Identity::new(Subject::Patient { patient_id: f.patient })
    }

    fn hospital(f: &Fixture) -> Identity {
        Identity::new(Subject::Hospital { hospital_id: f.hospital })
    }

    fn staff(f: &Fixture) -> Identity {
        Identity::new(Subject::LabStaff { staff_id: f.staff, hospital_id: f.hospital })
    }

    fn request(lab_id: i64) -> NewLabBooking {
        NewLabBooking {
            lab_id,
            patient_name: "Asha Rao".into(),
            phone: "9000000001".into(),
            address: "12 Lake Road".into(),
            test_type: "CBC".into(),
        }
    }

    fn upload() -> ReportUpload {
        ReportUpload { path: "uploads/cbc.pdf".into(), mime_type: "application/pdf".into() }
    }

    fn status(status: LabBookingStatus) -> LabStatusChange {
        LabStatusChange { status, collection_date: None, report_eta: None }
    }

    fn patient_messages(f: &Fixture) -> Vec<String> {
        db::list_notifications(&f.conn, Recipient::patient(f.patient), 20)
            .unwrap()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    #[test]
    fn lifecycle_from_request_to_report() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        assert_eq!(booking.status, LabBookingStatus::Pending);

        let hospital_inbox = db::list_notifications(&f.conn, Recipient::hospital(f.hospital), 20).unwrap();
        assert_eq!(hospital_inbox[0].message, "New Lab Booking Request from Asha Rao for CBC");

        let t1 = parse_datetime("collection_date", "2026-03-01T09:00").unwrap();
        let lab = hospital(&f);
        let confirmed = update_status(&mut f.conn, booking.id, &lab, &LabStatusChange {
            status: LabBookingStatus::Confirmed,
            collection_date: Some(t1),
            report_eta: None,
        })
        .unwrap();
        assert_eq!(confirmed.collection_date, Some(t1));
        assert!(patient_messages(&f)[0].contains("confirmed"));

        let collected = update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Collected)).unwrap();
        assert_eq!(collected.collection_date, Some(t1));
        assert!(patient_messages(&f)[0].contains("collected"));

        let done = complete(&mut f.conn, booking.id, &lab, &upload(), Some(f.doctor), &PendingAnalyzer).unwrap();
        assert_eq!(done.booking.status, LabBookingStatus::Completed);
        assert!(done.booking.report_eta.is_some());

        let stored = db::get_lab_booking_for_lab(&f.conn, booking.id, f.hospital).unwrap().unwrap();
        assert_eq!(stored.status, LabBookingStatus::Completed);
        assert_eq!(stored.collection_date, Some(t1));

        let report = db::get_lab_report(&f.conn, done.report_id).unwrap().unwrap();
        assert_eq!(report.patient_id, f.patient);
        assert_eq!(report.doctor_id, Some(f.doctor));
        assert_eq!(report.file_type, ReportFileType::Pdf);
        assert_eq!(report.analysis_result["summary"], "Analysis pending");

        assert_eq!(patient_messages(&f)[0], "Your Lab Report for CBC is ready! Check My Reports.");
        let doctor_inbox = db::list_notifications(&f.conn, Recipient::doctor(f.doctor), 20).unwrap();
        assert!(doctor_inbox[0].message.contains(&format!("(ID: {})", f.patient)));
    }

    #[test]
    fn lab_staff_act_for_their_hospital() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let staff = staff(&f);

        update_status(&mut f.conn, booking.id, &staff, &status(LabBookingStatus::Confirmed)).unwrap();
        update_status(&mut f.conn, booking.id, &staff, &status(LabBookingStatus::Collected)).unwrap();
        let done = complete(&mut f.conn, booking.id, &staff, &upload(), None, &PendingAnalyzer).unwrap();

        let report = db::get_lab_report(&f.conn, done.report_id).unwrap().unwrap();
        assert_eq!(report.uploaded_by_staff_id, Some(f.staff));
        assert_eq!(report.doctor_id, None);
    }

    #[test]
    fn completed_status_needs_a_report() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let lab = hospital(&f);
        update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Confirmed)).unwrap();

        let err = update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Completed)).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn pending_booking_cannot_be_completed() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let lab = hospital(&f);

        let err = complete(&mut f.conn, booking.id, &lab, &upload(), None, &PendingAnalyzer).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
        assert!(db::list_lab_reports_for_patient(&f.conn, f.patient).unwrap().is_empty());
    }

    #[test]
    fn confirmed_booking_cannot_skip_collection() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let lab = hospital(&f);
        update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Confirmed)).unwrap();

        let err = complete(&mut f.conn, booking.id, &lab, &upload(), Some(f.doctor), &PendingAnalyzer).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(msg) if msg.contains("confirmed to completed")));
        assert!(db::list_lab_reports_for_patient(&f.conn, f.patient).unwrap().is_empty());
        let stored = db::get_lab_booking_for_lab(&f.conn, booking.id, f.hospital).unwrap().unwrap();
        assert_eq!(stored.status, LabBookingStatus::Confirmed);
        assert!(stored.report_eta.is_none());
    }

    #[test]
    fn skipping_and_rewinding_conflict() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let lab = hospital(&f);

        let err = update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Collected)).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
        update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Confirmed)).unwrap();
        let err = update_status(&mut f.conn, booking.id, &lab, &status(LabBookingStatus::Pending)).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[test]
    fn other_hospital_cannot_touch_booking() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let other = Identity::new(Subject::Hospital { hospital_id: f.hospital + 50 });

        let err = update_status(&mut f.conn, booking.id, &other, &status(LabBookingStatus::Confirmed)).unwrap_err();
        assert!(matches!(err, WorkflowError::NotFoundOrUnauthorized(_)));
        let stored = db::get_lab_booking_for_lab(&f.conn, booking.id, f.hospital).unwrap().unwrap();
        assert_eq!(stored.status, LabBookingStatus::Pending);
        assert_eq!(patient_messages(&f).len(), 0);
    }

    #[test]
    fn medical_shop_is_forbidden_on_lab_routes() {
        let mut f = fixture();
        let who = patient(&f);
        let booking = create(&mut f.conn, &who, &request(f.hospital)).unwrap();
        let shop = Identity::new(Subject::Medical { medical_id: f.shop });

        let err = update_status(&mut f.conn, booking.id, &shop, &status(LabBookingStatus::Confirmed)).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn booking_unknown_lab_or_blank_fields() {
        let mut f = fixture();
        let who = patient(&f);
        let err = create(&mut f.conn, &who, &request(f.hospital + 9)).unwrap_err();
        assert!(matches!(err, WorkflowError::NotFoundOrUnauthorized(_)));

        let mut blank = request(f.hospital);
        blank.test_type = "  ".into();
        let err = create(&mut f.conn, &who, &blank).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(msg) if msg.contains("test_type")));
    }
}
