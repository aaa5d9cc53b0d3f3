// Application state (AppState)

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::api::analysis_client::AnalysisClient;
use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::security::password::PasswordHasher;
use crate::security::token::TokenService;
use crate::services::analyzer::Analyzer;
use crate::services::reputation::ReputationPolicy;
use crate::services::submission::SubmissionWorkflow;
use crate::stores::{image_store::ImageStore, result_store::ResultStore, user_store::UserStore};
use crate::utils::time::ObservationDate;
use crate::wal::wal::Wal;

/// Shared application state
///
/// Every component is constructed here and handed to its consumers
/// explicitly; handlers reach them through `State<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    /// Credential store
    pub users: Arc<UserStore>,

    pub images: Arc<ImageStore>,

    pub results: Arc<ResultStore>,

    /// Session token issuing and validation
    pub tokens: Arc<TokenService>,

    /// Submit-analyze-score orchestration
    pub workflow: Arc<SubmissionWorkflow>,

    pub metrics: Arc<Metrics>,

    /// Write-Ahead Log for persistence
    pub wal: Arc<Wal>,

    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the production analyzer client from config
    pub fn new(config: Config, wal: Wal) -> Result<Self> {
        let client = AnalysisClient::new(
            config.analysis.endpoint.clone(),
            Duration::from_secs(config.analysis.timeout_secs),
        )?;
        Self::with_analyzer(config, wal, Arc::new(client))
    }

    pub fn with_analyzer(config: Config, wal: Wal, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let config = Arc::new(config);
        let wal = Arc::new(wal);

        let secret = config.jwt_secret_bytes()?;
        let tokens = Arc::new(TokenService::new(&secret, config.auth.jwt_expiration_ms));

        let hasher = match (
            config.auth.hash_memory_kib,
            config.auth.hash_iterations,
            config.auth.hash_parallelism,
        ) {
            (None, None, None) => PasswordHasher::new(),
            (memory, iterations, parallelism) => PasswordHasher::with_params(
                memory.unwrap_or(19_456),
                iterations.unwrap_or(2),
                parallelism.unwrap_or(1),
            )
            .context("Invalid Argon2 parameters")?,
        };

        let users = Arc::new(UserStore::new(hasher, Arc::clone(&wal)));
        let images = Arc::new(ImageStore::new(Arc::clone(&wal)));
        let results = Arc::new(ResultStore::new(Arc::clone(&wal)));

        let workflow = Arc::new(SubmissionWorkflow::new(
            Arc::clone(&tokens),
            Arc::clone(&users),
            Arc::clone(&images),
            Arc::clone(&results),
            analyzer,
            ReputationPolicy::new(config.reputation.merit_threshold),
            ObservationDate::from_config(config.analysis.observation_date),
        ));

        Ok(Self {
            users,
            images,
            results,
            tokens,
            workflow,
            metrics: Arc::new(Metrics::new()),
            wal,
            config,
        })
    }
}
