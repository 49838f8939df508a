//! Shared types for the HTTP layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core_state::CoreState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
        }
    }
}

/// Success body: `{ "success": true, "message": ..., <data> }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Per-caller sliding-window limiter.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    pub fn with_limit(per_minute: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
        }
    }

    /// `Ok(())` when `key` is under its limit, otherwise `Err(retry_after_secs)`.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let window = Duration::from_secs(60);

        if self.windows.len() > 10_000 {
            self.windows
                .retain(|_, hits| hits.iter().any(|ts| now.duration_since(*ts) < window));
        }

        let entries = self.windows.entry(key.to_string()).or_default();
        entries.retain(|ts| now.duration_since(*ts) < window);

        if entries.len() as u32 >= self.per_minute {
            let oldest = entries.first().copied().unwrap_or(now);
            let retry = window.saturating_sub(now.duration_since(oldest)).as_secs().max(1);
            return Err(retry);
        }

        entries.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_allows_under_limit() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("patient:1").is_ok());
        assert!(limiter.check("patient:1").is_ok());
    }

    #[test]
    fn rate_limiter_rejects_over_per_minute() {
        let mut limiter = RateLimiter::with_limit(2);
        assert!(limiter.check("patient:1").is_ok());
        assert!(limiter.check("patient:1").is_ok());
        let retry = limiter.check("patient:1").unwrap_err();
        assert!((1..=60).contains(&retry));
    }

    #[test]
    fn rate_limiter_isolates_callers() {
        let mut limiter = RateLimiter::with_limit(1);
        assert!(limiter.check("patient:1").is_ok());
        assert!(limiter.check("doctor:1").is_ok());
        assert!(limiter.check("patient:1").is_err());
    }

    #[test]
    fn response_flattens_data() {
        #[derive(Serialize)]
        struct Data {
            id: i64,
        }
        let json = serde_json::to_value(ApiResponse::ok("Created", Data { id: 3 })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Created");
        assert_eq!(json["id"], 3);
    }
}
