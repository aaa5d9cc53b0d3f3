//! Shared state builder for handler tests

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tempfile::TempDir;

use crate::core::config::Config;
use crate::core::error::AnalysisError;
use crate::core::state::AppState;
use crate::models::user::{Role, User};
use crate::services::analyzer::{Analysis, Analyzer};
use crate::wal::wal::Wal;

pub struct FixedAnalyzer(pub Result<f64, u16>);

#[async_trait]
impl Analyzer for FixedAnalyzer {
    async fn analyze(&self, _: f64, _: f64, _: NaiveDate) -> Result<Analysis, AnalysisError> {
        match self.0 {
            Ok(loss) => Ok(Analysis {
                vegetation_loss_percent: loss,
                poisoning_detected: loss >= 50.0,
            }),
            Err(status) => Err(AnalysisError::Status(status)),
        }
    }
}

pub fn create_test_state() -> (Arc<AppState>, TempDir) {
    create_test_state_with(Ok(7.0))
}

pub fn create_test_state_with(outcome: Result<f64, u16>) -> (Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    let config = Config::from_toml(&format!(
        "[server]\nport = 8080\n[auth]\njwt_secret = \"KioqKioqKioqKioqKioqKioqKioqKioqKioqKioqKio=\"\n\
         hash_memory_kib = 64\nhash_iterations = 1\n[storage]\nwal_path = \"{}\"\n",
        wal_path.display()
    ))
    .unwrap();
    let wal = Wal::new(wal_path).unwrap();

    let state =
        AppState::with_analyzer(config, wal, Arc::new(FixedAnalyzer(outcome))).unwrap();
    (Arc::new(state), temp_dir)
}

/// Register `email` and return the user with a fresh token
pub async fn signed_in(state: &AppState, email: &str, role: Role) -> (User, String) {
    let user = state.users.create(email, "pw", role).await.unwrap();
    let token = state.tokens.issue(&user.email, user.role).unwrap();
    (user, token)
}
