//! Per-caller rate limiting: 100 requests per minute.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;

/// `role:id` for authenticated callers; everyone else shares one bucket.
fn caller_key(req: &Request) -> String {
    match req.extensions().get::<Identity>() {
        Some(identity) => format!("{}:{}", identity.role(), identity.subject_id()),
        None => "anonymous".to_string(),
    }
}

pub async fn limit(
    Extension(ctx): Extension<ApiContext>,
    req: Request,
    next: Next,
) -> Response {
    let key = caller_key(&req);
    let verdict = match ctx.rate_limiter.lock() {
        Ok(mut limiter) => limiter.check(&key),
        Err(_) => return ApiError::Internal("rate limiter lock poisoned".into()).into_response(),
    };

    if let Err(retry_after) = verdict {
        tracing::warn!(caller = %key, retry_after, "Rate limit exceeded");
        return ApiError::RateLimited { retry_after }.into_response();
    }
    next.run(req).await
}
