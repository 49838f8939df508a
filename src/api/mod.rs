//! CareLink HTTP API.
//!
//! Exposes the booking workflows as JSON endpoints. Routes are nested
//! under `/api/` and protected by a middleware stack:
//! Auth → Rate Limit → Audit → Handler.
//!
//! The router is composable: `api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
