//! Shared application state.
//!
//! `CoreState` is built once at startup from `AppConfig`, wrapped in `Arc`
//! and handed to the HTTP layer. Each request opens its own SQLite
//! connection; WAL plus the busy timeout serialise writers.

use std::sync::Arc;

use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::db;
use crate::workflow::reports::{PendingAnalyzer, ReportAnalyzer};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot prepare {path}: {reason}")]
    Storage { path: String, reason: String },
}

pub struct CoreState {
    pub config: AppConfig,
    auth: AuthGate,
    analyzer: Arc<dyn ReportAnalyzer>,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        let auth = AuthGate::new(config.jwt_secret.as_bytes());
        Self {
            config,
            auth,
            analyzer: Arc::new(PendingAnalyzer),
        }
    }

    /// Swap the report analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn ReportAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Create the upload directory and bring the schema up to date.
    pub fn initialize(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.config.upload_dir).map_err(|e| CoreError::Storage {
            path: self.config.upload_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        self.open_db()?;
        tracing::info!(
            database = %self.config.database_path.display(),
            uploads = %self.config.upload_dir.display(),
            "Storage ready"
        );
        Ok(())
    }

    /// Open a connection to the configured database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        Ok(db::open_database(
            &self.config.database_path,
            self.config.busy_timeout(),
        )?)
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub fn analyzer(&self) -> &dyn ReportAnalyzer {
        self.analyzer.as_ref()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::auth::{Identity, Subject};
    use serde_json::{json, Value};
    use crate::workflow::reports::ReportUpload;

    struct FixedAnalyzer;

    impl ReportAnalyzer for FixedAnalyzer {
        fn analyze(&self, _upload: &ReportUpload) -> Value {
            json!({ "summary": "normal" })
        }
    }

    #[test]
    fn initialize_creates_database_and_uploads() {
        let tmp = tempfile::tempdir().unwrap();
        let core = test_core(tmp.path());
        assert!(core.config.database_path.exists());
        assert!(core.config.upload_dir.is_dir());
        let conn = core.open_db().unwrap();
        assert_eq!(db::count_tables(&conn).unwrap(), 13);
    }

    #[test]
    fn auth_gate_uses_configured_secret() {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::new(test_config(tmp.path()));
        let identity = Identity::new(Subject::Doctor { doctor_id: 5 });
        let token = core.auth().issue(&identity).unwrap();

        let other = AuthGate::new(b"another-secret-of-sufficient-length!!");
        assert!(other.verify(&token).is_err());
        assert_eq!(core.auth().verify(&token).unwrap(), identity);
    }

    #[test]
    fn analyzer_can_be_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::new(test_config(tmp.path())).with_analyzer(Arc::new(FixedAnalyzer));
        let upload = ReportUpload { path: "x.pdf".into(), mime_type: "application/pdf".into() };
        assert_eq!(core.analyzer().analyze(&upload)["summary"], "normal");
    }
}
