//! CareLink API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! CORS → Cache-Control → Extension → Auth → Rate limit → Audit → Handler

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext`.
#[cfg(test)]
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    use endpoints::{
        admin, appointments, directory, lab_bookings, medicine_bookings, notifications, prescriptions,
        reports,
    };

    // Layers are applied from bottom (innermost) to top (outermost).
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/appointments", post(appointments::book).get(appointments::list))
        .route("/appointments/:id/accept", put(appointments::accept))
        .route("/appointments/:id/reject", put(appointments::reject))
        .route("/appointments/:id/share-details", put(appointments::share_details))
        .route("/appointments/:id/payment", post(appointments::pay))
        .route("/doctors", get(directory::doctors))
        .route("/doctors/availability", put(appointments::set_availability))
        .route("/labs", get(directory::labs))
        .route("/medical-shops", get(directory::medical_shops))
        .route("/prescriptions", post(prescriptions::create).get(prescriptions::list_own))
        .route("/prescriptions/patient/:id", get(prescriptions::list_for_patient))
        .route("/lab-bookings", post(lab_bookings::create).get(lab_bookings::list))
        .route("/lab-bookings/:id/status", put(lab_bookings::update_status))
        .route(
            "/lab-bookings/:id/complete",
            post(lab_bookings::complete)
                .layer(DefaultBodyLimit::max(lab_bookings::MAX_REPORT_BYTES + 64 * 1024)),
        )
        .route(
            "/medicine-bookings",
            post(medicine_bookings::create).get(medicine_bookings::list),
        )
        .route("/medicine-bookings/:id/status", put(medicine_bookings::update_status))
        .route("/medicine-bookings/:id/respond", put(medicine_bookings::respond))
        .route("/reports", get(reports::list))
        .route("/reports/:id", get(reports::get))
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", put(notifications::mark_read))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/patients/:id", delete(admin::delete_patient))
        .route("/admin/doctors/:id", delete(admin::delete_doctor))
        .route("/admin/hospitals/:id", delete(admin::delete_hospital))
        .route("/admin/medical-shops/:id", delete(admin::delete_medical_shop))
        .route("/admin/doctors/:id/verify", put(admin::verify_doctor))
        .route("/admin/hospitals/:id/verify", put(admin::verify_hospital))
        .route("/admin/lab-staff/:id/verify", put(admin::verify_lab_staff))
        .route("/admin/medical-shops/:id/verify", put(admin::verify_medical_shop))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (rate-limited only, no auth required)
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::api::types::RateLimiter;
    use crate::auth::{Identity, Subject};
    use crate::core_state::testing::test_core;
    use crate::db;
    use crate::models::enums::AvailabilityStatus;
    use crate::models::*;

    struct Harness {
        app: Router,
        core: Arc<CoreState>,
        patient: i64,
        doctor: i64,
        hospital: i64,
        shop: i64,
        _tmp: tempfile::TempDir,
    }

    impl Harness {
        fn token(&self, subject: Subject) -> String {
            self.core.auth().issue(&Identity::new(subject)).unwrap()
        }

        fn patient_token(&self) -> String {
            self.token(Subject::Patient { patient_id: self.patient })
        }

        fn doctor_token(&self) -> String {
            self.token(Subject::Doctor { doctor_id: self.doctor })
        }

        fn hospital_token(&self) -> String {
            self.token(Subject::Hospital { hospital_id: self.hospital })
        }

        fn shop_token(&self) -> String {
            self.token(Subject::Medical { medical_id: self.shop })
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let response = self.app.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&body).unwrap_or(Value::Null)
            };
            (status, json)
        }
    }

    fn harness_with(build: impl FnOnce(ApiContext) -> ApiContext) -> Harness {
        let tmp = tempfile::tempdir().unwrap();
        let core = test_core(tmp.path());
        let conn = core.open_db().unwrap();
        let patient = db::insert_patient(&conn, &NewPatient {
            name: "Asha Rao".into(),
            phone: "9000000001".into(),
            email: "asha@example.com".into(),
            ..Default::default()
        })
        .unwrap();
        let doctor = db::insert_doctor(&conn, &NewDoctor {
            name: "Dr. Iyer".into(),
            specialization: "Cardiology".into(),
            hospital_name: None,
            phone: None,
            email: "iyer@example.com".into(),
            fees: 500.0,
            availability_status: AvailabilityStatus::Available,
            license_number: None,
        })
        .unwrap();
        let hospital = db::insert_hospital(&conn, &NewHospital {
            hospital_name: "General Hospital".into(),
            email: "general@example.com".into(),
            ..Default::default()
        })
        .unwrap();
        let shop = db::insert_medical_shop(&conn, &NewMedicalShop {
            shop_name: "City Pharmacy".into(),
            owner_name: "R. Menon".into(),
            email: "city@example.com".into(),
            ..Default::default()
        })
        .unwrap();

        let ctx = build(ApiContext::new(core.clone()));
        Harness {
            app: api_router_with_ctx(ctx),
            core,
            patient,
            doctor,
            hospital,
            shop,
            _tmp: tmp,
        }
    }

    fn harness() -> Harness {
        harness_with(|ctx| ctx)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn health_is_public_and_not_cached() {
        let h = harness();
        let response = h
            .app
            .clone()
            .oneshot(request("GET", "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn protected_route_requires_token() {
        let h = harness();
        let (status, body) = h.send(request("GET", "/api/notifications", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "AUTH_REQUIRED");

        let (status, _) = h
            .send(request("GET", "/api/notifications", Some("not-a-jwt"), None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let h = harness();
        let token = h.patient_token();
        let (status, body) = h.send(request("GET", "/api/admin/stats", Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn medicine_order_over_http() {
        let h = harness();
        let patient = h.patient_token();
        let shop = h.shop_token();

        let (status, body) = h
            .send(request(
                "POST",
                "/api/medicine-bookings",
                Some(&patient),
                Some(json!({
                    "medical_id": h.shop,
                    "patient_name": "Asha Rao",
                    "phone": "9000000001",
                    "address": "12 Lake Road"
                })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let id = body["booking"]["id"].as_i64().unwrap();

        let (status, body) = h
            .send(request(
                "PUT",
                &format!("/api/medicine-bookings/{id}/status"),
                Some(&shop),
                Some(json!({ "status": "accepted", "cost": 250, "delivery_date": "2026-03-02T17:30" })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["booking"]["status"], "accepted");

        let (status, body) = h.send(request("GET", "/api/notifications", Some(&patient), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unread"], 2);
        let latest = body["notifications"][0]["message"].as_str().unwrap();
        assert!(latest.contains("250"));
        assert!(latest.contains("02 Mar 2026, 05:30 PM"));

        let (status, body) = h
            .send(request(
                "PUT",
                &format!("/api/medicine-bookings/{id}/status"),
                Some(&shop),
                Some(json!({ "status": "delivered" })),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn other_shop_gets_not_found() {
        let h = harness();
        let patient = h.patient_token();
        let (_, body) = h
            .send(request(
                "POST",
                "/api/medicine-bookings",
                Some(&patient),
                Some(json!({
                    "medical_id": h.shop,
                    "patient_name": "Asha Rao",
                    "phone": "9000000001",
                    "address": "12 Lake Road"
                })),
            ))
            .await;
        let id = body["booking"]["id"].as_i64().unwrap();

        let stranger = h.token(Subject::Medical { medical_id: h.shop + 1 });
        let (status, _) = h
            .send(request(
                "PUT",
                &format!("/api/medicine-bookings/{id}/status"),
                Some(&stranger),
                Some(json!({ "status": "accepted" })),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lab_booking_completes_with_multipart_report() {
        let h = harness();
        let patient = h.patient_token();
        let hospital = h.hospital_token();

        let (status, body) = h
            .send(request(
                "POST",
                "/api/lab-bookings",
                Some(&patient),
                Some(json!({
                    "lab_id": h.hospital,
                    "patient_name": "Asha Rao",
                    "phone": "9000000001",
                    "address": "12 Lake Road",
                    "test_type": "CBC"
                })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["booking"]["id"].as_i64().unwrap();

        for change in [
            json!({ "status": "confirmed", "collection_date": "2026-03-01T09:00" }),
            json!({ "status": "collected" }),
        ] {
            let (status, _) = h
                .send(request(
                    "PUT",
                    &format!("/api/lab-bookings/{id}/status"),
                    Some(&hospital),
                    Some(change),
                ))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let boundary = "carelinkboundary";
        let multipart = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"doctor_id\"\r\n\r\n{doctor}\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"report\"; filename=\"cbc.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4 test report\r\n--{boundary}--\r\n",
            doctor = h.doctor,
        );
        let req = Request::builder()
            .method("POST")
            .uri(format!("/api/lab-bookings/{id}/complete"))
            .header("Authorization", format!("Bearer {hospital}"))
            .header("Content-Type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(multipart))
            .unwrap();
        let (status, body) = h.send(req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["booking"]["status"], "completed");

        let report_id = body["report_id"].as_i64().unwrap();
        let conn = h.core.open_db().unwrap();
        let report = db::get_lab_report(&conn, report_id).unwrap().unwrap();
        assert_eq!(report.patient_id, h.patient);
        assert_eq!(report.doctor_id, Some(h.doctor));
        assert!(std::path::Path::new(&report.file_path).exists());

        let doctor = h.doctor_token();
        let (_, body) = h.send(request("GET", "/api/notifications", Some(&doctor), None)).await;
        let messages: Vec<&str> = body["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["message"].as_str())
            .collect();
        assert!(messages.iter().any(|m| m.contains("new lab report")));

        for token in [&patient, &doctor] {
            let (status, body) = h.send(request("GET", "/api/reports", Some(token), None)).await;
            assert_eq!(status, StatusCode::OK);
            let ids: Vec<i64> = body["reports"]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|r| r["id"].as_i64())
                .collect();
            assert_eq!(ids, vec![report_id]);
        }
        let (status, body) = h
            .send(request("GET", &format!("/api/reports/{report_id}"), Some(&doctor), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["report_type"], "CBC");

        let (status, _) = h.send(request("GET", "/api/reports", Some(&h.shop_token()), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn discovery_lists_bookable_targets() {
        let h = harness();
        let patient = h.patient_token();
        {
            let conn = h.core.open_db().unwrap();
            db::insert_doctor(&conn, &NewDoctor {
                name: "Dr. Bose".into(),
                specialization: "Dermatology".into(),
                hospital_name: None,
                phone: None,
                email: "bose@example.com".into(),
                fees: 300.0,
                availability_status: AvailabilityStatus::NotAvailable,
                license_number: None,
            })
            .unwrap();
        }

        let (status, body) = h.send(request("GET", "/api/doctors", Some(&patient), None)).await;
        assert_eq!(status, StatusCode::OK);
        let doctors = body["doctors"].as_array().unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0]["id"].as_i64(), Some(h.doctor));

        let (status, body) = h.send(request("GET", "/api/labs", Some(&patient), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["labs"][0]["id"].as_i64(), Some(h.hospital));

        let (status, body) = h.send(request("GET", "/api/medical-shops", Some(&patient), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["medical_shops"][0]["id"].as_i64(), Some(h.shop));

        let (status, _) = h.send(request("GET", "/api/labs", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn completion_without_report_is_rejected_and_nothing_stored() {
        let h = harness();
        let hospital = h.hospital_token();
        let boundary = "b";
        let req = Request::builder()
            .method("POST")
            .uri("/api/lab-bookings/1/complete")
            .header("Authorization", format!("Bearer {hospital}"))
            .header("Content-Type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(format!("--{boundary}--\r\n")))
            .unwrap();
        let (status, body) = h.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
        let stored = std::fs::read_dir(&h.core.config.upload_dir).unwrap().count();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn appointment_decisions_and_mark_read() {
        let h = harness();
        let patient = h.patient_token();
        let doctor = h.doctor_token();

        let (status, body) = h
            .send(request("POST", "/api/appointments", Some(&patient), Some(json!({ "doctor_id": h.doctor }))))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["appointment"]["id"].as_i64().unwrap();
        assert_eq!(body["appointment"]["payment_amount"], 500.0);

        let (status, _) = h
            .send(request("PUT", &format!("/api/appointments/{id}/accept"), Some(&doctor), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = h
            .send(request("PUT", &format!("/api/appointments/{id}/reject"), Some(&doctor), None))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = h.send(request("GET", "/api/notifications", Some(&patient), None)).await;
        let nid = body["notifications"][0]["id"].as_i64().unwrap();
        for _ in 0..2 {
            let (status, _) = h
                .send(request("PUT", &format!("/api/notifications/{nid}/read"), Some(&patient), None))
                .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = h
            .send(request("PUT", &format!("/api/notifications/{nid}/read"), Some(&doctor), None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_deletes_and_verifies() {
        let h = harness();
        let admin = h.token(Subject::Admin { admin_id: 1 });

        let (status, _) = h
            .send(request("PUT", &format!("/api/admin/doctors/{}/verify", h.doctor), Some(&admin), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        let conn = h.core.open_db().unwrap();
        assert!(db::get_doctor(&conn, h.doctor).unwrap().unwrap().is_verified);

        let uri = format!("/api/admin/medical-shops/{}", h.shop);
        let (status, _) = h.send(request("DELETE", &uri, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = h.send(request("DELETE", &uri, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = h.send(request("GET", "/api/admin/stats", Some(&admin), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["medical_shops"], 0);
        assert_eq!(body["stats"]["patients"], 1);
    }

    #[tokio::test]
    async fn rate_limit_applies_per_identity() {
        let h = harness_with(|mut ctx| {
            ctx.rate_limiter = Arc::new(Mutex::new(RateLimiter::with_limit(2)));
            ctx
        });
        let patient = h.patient_token();
        let doctor = h.doctor_token();

        for _ in 0..2 {
            let (status, _) = h.send(request("GET", "/api/notifications", Some(&patient), None)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let response = h
            .app
            .clone()
            .oneshot(request("GET", "/api/notifications", Some(&patient), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("Retry-After"));

        let (status, _) = h.send(request("GET", "/api/notifications", Some(&doctor), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_datetime_is_validation_error() {
        let h = harness();
        let patient = h.patient_token();
        let (_, body) = h
            .send(request("POST", "/api/appointments", Some(&patient), Some(json!({ "doctor_id": h.doctor }))))
            .await;
        let id = body["appointment"]["id"].as_i64().unwrap();
        let doctor = h.doctor_token();
        h.send(request("PUT", &format!("/api/appointments/{id}/accept"), Some(&doctor), None)).await;

        let (status, body) = h
            .send(request(
                "PUT",
                &format!("/api/appointments/{id}/share-details"),
                Some(&doctor),
                Some(json!({ "meet_link": "https://meet.example.com/x", "meeting_time": "soon" })),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
