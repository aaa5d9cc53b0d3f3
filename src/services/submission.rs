//! Submit an observation, analyze it, and score the submitter

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::error::{AnalysisError, StoreError, SubmissionError};
use crate::models::image::{ImageLocation, NewImageLocation};
use crate::models::result::AnalysisResult;
use crate::models::user::User;
use crate::security::token::TokenService;
use crate::services::analyzer::Analyzer;
use crate::services::reputation::{ReputationChange, ReputationPolicy};
use crate::stores::{image_store::ImageStore, result_store::ResultStore, user_store::UserStore};
use crate::utils::time::ObservationDate;

/// Everything a successful submission produced
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub image: ImageLocation,
    pub result: AnalysisResult,
    pub change: ReputationChange,
    pub user: User,
}

pub struct SubmissionWorkflow {
    tokens: Arc<TokenService>,
    users: Arc<UserStore>,
    images: Arc<ImageStore>,
    results: Arc<ResultStore>,
    analyzer: Arc<dyn Analyzer>,
    policy: ReputationPolicy,
    observation_date: ObservationDate,
}

impl SubmissionWorkflow {
    pub fn new(
        tokens: Arc<TokenService>,
        users: Arc<UserStore>,
        images: Arc<ImageStore>,
        results: Arc<ResultStore>,
        analyzer: Arc<dyn Analyzer>,
        policy: ReputationPolicy,
        observation_date: ObservationDate,
    ) -> Self {
        Self {
            tokens,
            users,
            images,
            results,
            analyzer,
            policy,
            observation_date,
        }
    }

    /// Run one submission end to end.
    ///
    /// The image location is persisted before analysis and stays persisted if
    /// the analyzer fails. The result and the reputation change are committed
    /// together: if the owner disappears before the counter update, the result
    /// is removed again.
    pub async fn submit(
        &self,
        token: Option<&str>,
        location: NewImageLocation,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let user = self.resolve_principal(token)?;

        // Ownership always comes from the token, never from the request body
        let image = self.images.insert(user.id, location)?;
        info!(user_id = user.id, image_id = image.id, "Image location saved");

        let date = self.observation_date.resolve();
        let analysis = match self
            .analyzer
            .analyze(image.latitude, image.longitude, date)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(
                    user_id = user.id,
                    image_id = image.id,
                    error = %e,
                    "Vegetation analysis failed, no result recorded"
                );
                return Err(e.into());
            }
        };

        if !analysis.vegetation_loss_percent.is_finite() {
            let e = AnalysisError::InvalidValue(format!(
                "vegetation_loss_percent = {}",
                analysis.vegetation_loss_percent
            ));
            error!(user_id = user.id, image_id = image.id, error = %e, "Rejected analyzer response");
            return Err(e.into());
        }

        let result = self.results.insert(user.id, &analysis)?;
        let change = self.policy.evaluate(result.vegetation_loss_percent);

        let user = match self.users.record_outcome(user.id, change) {
            Ok(user) => user,
            Err(e) => {
                warn!(
                    user_id = user.id,
                    result_id = result.id,
                    error = %e,
                    "Reputation update failed, removing result"
                );
                if let Err(undo) = self.results.remove(result.id) {
                    error!(result_id = result.id, error = %undo, "Failed to remove orphaned result");
                }
                return Err(match e {
                    StoreError::UserNotFound(_) => {
                        SubmissionError::Unauthorized("Invalid user".to_string())
                    }
                    other => other.into(),
                });
            }
        };

        info!(
            user_id = user.id,
            result_id = result.id,
            vegetation_loss_percent = result.vegetation_loss_percent,
            poisoning_detected = result.poisoning_detected,
            change = ?change,
            merit = user.merit,
            foul_count = user.foul_count,
            "Submission scored"
        );

        Ok(SubmissionOutcome {
            image,
            result,
            change,
            user,
        })
    }

    /// Steps 1-3: token present, valid for its subject, subject is a known user
    fn resolve_principal(&self, token: Option<&str>) -> Result<User, SubmissionError> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SubmissionError::Unauthorized("Missing or invalid token".to_string()))?;

        let email = self.tokens.extract_subject(token).map_err(|e| {
            warn!(error = %e, "Rejected submission token");
            SubmissionError::Unauthorized("Missing or invalid token".to_string())
        })?;

        if !self.tokens.validate(token, &email) {
            warn!(email = %email, "Submission token failed validation");
            return Err(SubmissionError::Unauthorized("Invalid token".to_string()));
        }

        self.users.get_by_email(&email).ok_or_else(|| {
            warn!(email = %email, "Submission token names an unknown user");
            SubmissionError::Unauthorized("Invalid user".to_string())
        })
    }
}
