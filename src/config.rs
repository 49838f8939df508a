use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "CareLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Errors raised while assembling the runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CARELINK_JWT_SECRET is not set")]
    MissingSecret,
    #[error("CARELINK_JWT_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Runtime configuration, injected into `CoreState` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub busy_timeout_ms: u64,
}

impl AppConfig {
    /// Build a configuration from `CARELINK_*` environment variables,
    /// falling back to defaults under `~/CareLink/`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("CARELINK_JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let database_path = match lookup("CARELINK_DATABASE") {
            Some(p) => PathBuf::from(p),
            None => app_data_dir()?.join("carelink.db"),
        };

        let upload_dir = match lookup("CARELINK_UPLOAD_DIR") {
            Some(p) => PathBuf::from(p),
            None => app_data_dir()?.join("uploads"),
        };

        let bind = lookup("CARELINK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidValue {
            key: "CARELINK_BIND",
            value: bind.clone(),
        })?;

        let busy_timeout_ms = match lookup("CARELINK_BUSY_TIMEOUT_MS") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CARELINK_BUSY_TIMEOUT_MS",
                value: v.clone(),
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            database_path,
            bind_addr,
            jwt_secret,
            upload_dir,
            busy_timeout_ms,
        })
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Get the application data directory (~/CareLink/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,carelink=debug,tower_http=info"
}
