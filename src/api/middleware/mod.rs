//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token to `Identity`
//! 2. Rate limiter: per identity, 100 requests per minute
//! 3. Audit logger: method, path, caller and status

pub mod audit;
pub mod auth;
pub mod rate;
