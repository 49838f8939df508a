//! Access log for every API request.
//!
//! Runs innermost, after auth has injected the `Identity`.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::Identity;

pub async fn log_access(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let caller = req.extensions().get::<Identity>().map(|who| (who.role(), who.subject_id()));
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match caller {
        Some((role, caller_id)) => {
            tracing::info!(%method, %path, %role, caller_id, status, elapsed_ms, "API access")
        }
        None => tracing::info!(%method, %path, status, elapsed_ms, "API access"),
    }
    response
}
