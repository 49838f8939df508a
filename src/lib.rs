pub mod api;
pub mod auth;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod workflow;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::ServerError;
use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

/// Failures that stop the service before it can serve requests.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Load configuration, prepare storage and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let core = CoreState::new(config);
    core.initialize()?;

    let mut server = api::start_api_server(Arc::new(core), bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
