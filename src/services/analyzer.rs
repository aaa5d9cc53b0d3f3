use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::AnalysisError;

/// Vegetation analysis for one location on one date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub vegetation_loss_percent: f64,
    pub poisoning_detected: bool,
}

/// Seam between the submission workflow and the external analyzer
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// At most one attempt; no retries
    async fn analyze(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Analysis, AnalysisError>;
}
