use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::error::AnalysisError;
use crate::services::analyzer::{Analysis, Analyzer};

/// HTTP client for the external vegetation analyzer
pub struct AnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisResponse {
    pub vegetation_loss_percent: f64,
    pub poisoning_detected: bool,
}

impl AnalysisClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Analysis, AnalysisError> {
        let request = AnalysisRequest {
            latitude,
            longitude,
            date: date.format("%Y-%m-%d").to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let parsed: AnalysisResponse =
            serde_json::from_slice(&body).map_err(|e| AnalysisError::Decode(e.to_string()))?;

        Ok(Analysis {
            vegetation_loss_percent: parsed.vegetation_loss_percent,
            poisoning_detected: parsed.poisoning_detected,
        })
    }
}
