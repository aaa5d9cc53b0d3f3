use crate::core::error::StoreError;
use crate::models::result::AnalysisResult;
use crate::services::analyzer::Analysis;
use crate::wal::wal::{Wal, WalOperation};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Analysis results; written once per successful analysis, never updated
pub struct ResultStore {
    results: DashMap<u32, AnalysisResult>,
    next_id: AtomicU32,
    wal: Arc<Wal>,
}

impl ResultStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            results: DashMap::new(),
            next_id: AtomicU32::new(1),
            wal,
        }
    }

    pub fn insert(&self, user_id: u32, analysis: &Analysis) -> Result<AnalysisResult, StoreError> {
        let result = AnalysisResult {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            vegetation_loss_percent: analysis.vegetation_loss_percent,
            poisoning_detected: analysis.poisoning_detected,
            created_at: Utc::now(),
        };

        self.wal
            .log_operation(&WalOperation::AddResult { result: result.clone() })
            .map_err(|e| StoreError::Persistence(e.to_string()))?;

        self.results.insert(result.id, result.clone());
        Ok(result)
    }

    /// Compensating removal for a result whose reputation update failed
    pub fn remove(&self, id: u32) -> Result<Option<AnalysisResult>, StoreError> {
        if !self.results.contains_key(&id) {
            return Ok(None);
        }

        self.wal
            .log_operation(&WalOperation::RemoveResult { id })
            .map_err(|e| StoreError::Persistence(e.to_string()))?;

        Ok(self.results.remove(&id).map(|(_, result)| result))
    }

    pub fn get(&self, id: u32) -> Option<AnalysisResult> {
        self.results.get(&id).map(|entry| entry.value().clone())
    }

    pub fn list_by_user(&self, user_id: u32) -> Vec<AnalysisResult> {
        let mut results: Vec<AnalysisResult> = self
            .results
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by_key(|result| result.id);
        results
    }

    pub fn purge_user(&self, user_id: u32) -> usize {
        let before = self.results.len();
        self.results.retain(|_, result| result.user_id != user_id);
        before - self.results.len()
    }

    pub fn restore(&self, result: AnalysisResult) {
        self.next_id.fetch_max(result.id + 1, Ordering::SeqCst);
        self.results.insert(result.id, result);
    }

    pub fn forget(&self, id: u32) {
        self.results.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
