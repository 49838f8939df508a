//! Administration endpoints: dashboard counts, actor removal and verification.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::{Capability, Identity};
use crate::db::{self, DashboardStats, VerifiableActor};

#[derive(Serialize)]
pub struct StatsBody {
    pub stats: DashboardStats,
}

#[derive(Serialize)]
pub struct ActorBody {
    pub id: i64,
}

/// Actor tables an admin can delete from.
#[derive(Debug, Clone, Copy)]
enum Removable {
    Patient,
    Doctor,
    Hospital,
    MedicalShop,
}

/// `GET /api/admin/stats`
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<StatsBody>>, ApiError> {
    identity.require(Capability::Admin)?;
    let conn = ctx.core.open_db()?;
    let stats = db::dashboard_stats(&conn)?;
    Ok(Json(ApiResponse::ok("Dashboard stats fetched", StatsBody { stats })))
}

fn remove(ctx: &ApiContext, identity: &Identity, kind: Removable, id: i64) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    identity.require(Capability::Admin)?;
    let mut conn = ctx.core.open_db()?;
    let tx = conn.transaction().map_err(db::DatabaseError::from)?;
    let (removed, label) = match kind {
        Removable::Patient => (db::delete_patient(&tx, id)?, "Patient"),
        Removable::Doctor => (db::delete_doctor(&tx, id)?, "Doctor"),
        Removable::Hospital => (db::delete_hospital(&tx, id)?, "Hospital"),
        Removable::MedicalShop => (db::delete_medical_shop(&tx, id)?, "Medical shop"),
    };
    if !removed {
        return Err(ApiError::NotFound(format!("{label} not found")));
    }
    tx.commit().map_err(db::DatabaseError::from)?;
    tracing::info!(admin_id = identity.subject_id(), actor = label, id, "Actor deleted");
    Ok(Json(ApiResponse::ok(format!("{label} deleted"), ActorBody { id })))
}

fn verify(ctx: &ApiContext, identity: &Identity, actor: VerifiableActor, id: i64) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    identity.require(Capability::Admin)?;
    let conn = ctx.core.open_db()?;
    if !db::set_verified(&conn, actor, id)? {
        return Err(ApiError::NotFound(format!("{actor:?} not found")));
    }
    tracing::info!(admin_id = identity.subject_id(), actor = ?actor, id, "Actor verified");
    Ok(Json(ApiResponse::ok("Verified", ActorBody { id })))
}

/// `DELETE /api/admin/patients/:id`
pub async fn delete_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    remove(&ctx, &identity, Removable::Patient, id)
}

/// `DELETE /api/admin/doctors/:id`
pub async fn delete_doctor(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    remove(&ctx, &identity, Removable::Doctor, id)
}

/// `DELETE /api/admin/hospitals/:id`
pub async fn delete_hospital(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    remove(&ctx, &identity, Removable::Hospital, id)
}

/// `DELETE /api/admin/medical-shops/:id`
pub async fn delete_medical_shop(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    remove(&ctx, &identity, Removable::MedicalShop, id)
}

/// `PUT /api/admin/doctors/:id/verify`
pub async fn verify_doctor(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    verify(&ctx, &identity, VerifiableActor::Doctor, id)
}

/// `PUT /api/admin/hospitals/:id/verify`
pub async fn verify_hospital(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    verify(&ctx, &identity, VerifiableActor::Hospital, id)
}

/// `PUT /api/admin/lab-staff/:id/verify`
pub async fn verify_lab_staff(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    verify(&ctx, &identity, VerifiableActor::LabStaff, id)
}

/// `PUT /api/admin/medical-shops/:id/verify`
pub async fn verify_medical_shop(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ActorBody>>, ApiError> {
    verify(&ctx, &identity, VerifiableActor::MedicalShop, id)
}
