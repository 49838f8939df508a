//! Bearer token authentication middleware.
//!
//! Verifies `Authorization: Bearer <token>` with the configured `AuthGate`
//! and injects the caller's `Identity` into request extensions.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub async fn require_auth(
    Extension(ctx): Extension<ApiContext>,
    mut req: Request,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match ctx.core.auth().verify_header(bearer) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(path = %req.uri().path(), error = %err, "Rejected credentials");
            ApiError::from(err).into_response()
        }
    }
}
