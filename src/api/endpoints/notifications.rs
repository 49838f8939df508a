//! Notification inbox endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::Identity;
use crate::models::Notification;
use crate::workflow::notifications;

#[derive(Serialize)]
pub struct InboxBody {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

#[derive(Serialize)]
pub struct ReadBody {
    pub id: i64,
}

/// `GET /api/notifications`: latest 20, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<InboxBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let notifications = notifications::list(&conn, &identity)?;
    let unread = notifications::unread_count(&conn, &identity)?;
    Ok(Json(ApiResponse::ok("Notifications fetched", InboxBody { notifications, unread })))
}

/// `PUT /api/notifications/:id/read`
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReadBody>>, ApiError> {
    let conn = ctx.core.open_db()?;
    notifications::mark_read(&conn, id, &identity)?;
    Ok(Json(ApiResponse::ok("Notification marked as read", ReadBody { id })))
}
