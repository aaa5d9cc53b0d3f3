use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one analysis call, owned by the submitting user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: u32,
    pub user_id: u32,
    pub vegetation_loss_percent: f64,
    pub poisoning_detected: bool,
    pub created_at: DateTime<Utc>,
}
