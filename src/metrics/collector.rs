use std::sync::atomic::{AtomicU64, Ordering};
use crate::stores::image_store::ImageStore;
use crate::stores::result_store::ResultStore;
use crate::stores::user_store::UserStore;
use crate::services::reputation::ReputationChange;
use crate::utils::time::current_timestamp;
use serde::Serialize;

pub struct Metrics {
    pub registrations: AtomicU64,
    pub successful_logins: AtomicU64,
    pub failed_logins: AtomicU64,
    pub total_submissions: AtomicU64,
    pub successful_submissions: AtomicU64,
    pub upstream_failures: AtomicU64,
    pub merit_awarded: AtomicU64,
    pub fouls_recorded: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub successful_logins: u64,
    pub failed_logins: u64,
    pub total_submissions: u64,
    pub successful_submissions: u64,
    pub upstream_failures: u64,
    pub success_rate: f64,
    pub merit_awarded: u64,
    pub fouls_recorded: u64,
    pub users: usize,
    pub image_locations: usize,
    pub results: usize,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            successful_logins: AtomicU64::new(0),
            failed_logins: AtomicU64::new(0),
            total_submissions: AtomicU64::new(0),
            successful_submissions: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            merit_awarded: AtomicU64::new(0),
            fouls_recorded: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self, success: bool) {
        if success {
            self.successful_logins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_logins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_submissions(&self) {
        self.total_submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, change: ReputationChange) {
        self.successful_submissions.fetch_add(1, Ordering::Relaxed);
        match change {
            ReputationChange::Merit(points) => {
                self.merit_awarded.fetch_add(u64::from(points), Ordering::Relaxed);
            }
            ReputationChange::Foul => {
                self.fouls_recorded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Counters plus store sizes, with success_rate and uptime derived
    pub fn get_snapshot(
        &self,
        users: &UserStore,
        images: &ImageStore,
        results: &ResultStore,
    ) -> MetricsSnapshot {
        let total_submissions = self.total_submissions.load(Ordering::Relaxed);
        let successful_submissions = self.successful_submissions.load(Ordering::Relaxed);

        let success_rate = if total_submissions > 0 {
            (successful_submissions as f64 / total_submissions as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            successful_logins: self.successful_logins.load(Ordering::Relaxed),
            failed_logins: self.failed_logins.load(Ordering::Relaxed),
            total_submissions,
            successful_submissions,
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            success_rate,
            merit_awarded: self.merit_awarded.load(Ordering::Relaxed),
            fouls_recorded: self.fouls_recorded.load(Ordering::Relaxed),
            users: users.len(),
            image_locations: images.len(),
            results: results.len(),
            uptime_seconds: current_timestamp() - self.start_time,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::password::PasswordHasher;
    use crate::wal::wal::Wal;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();

        assert_eq!(metrics.total_submissions.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.merit_awarded.load(Ordering::Relaxed), 0);
        assert!(metrics.start_time > 0);
    }

    #[test]
    fn test_record_outcome_splits_merit_and_fouls() {
        let metrics = Metrics::new();

        metrics.record_outcome(ReputationChange::Merit(7));
        metrics.record_outcome(ReputationChange::Merit(4));
        metrics.record_outcome(ReputationChange::Foul);

        assert_eq!(metrics.successful_submissions.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.merit_awarded.load(Ordering::Relaxed), 11);
        assert_eq!(metrics.fouls_recorded.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_snapshot_success_rate() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Arc::new(Wal::new(temp_dir.path().join("m.wal")).unwrap());
        let users = UserStore::new(PasswordHasher::with_params(64, 1, 1).unwrap(), Arc::clone(&wal));
        let images = ImageStore::new(Arc::clone(&wal));
        let results = ResultStore::new(wal);

        let metrics = Metrics::new();
        for _ in 0..4 {
            metrics.increment_submissions();
        }
        metrics.record_outcome(ReputationChange::Foul);
        metrics.increment_upstream_failures();
        metrics.record_login(false);

        let snapshot = metrics.get_snapshot(&users, &images, &results);
        assert_eq!(snapshot.total_submissions, 4);
        assert_eq!(snapshot.success_rate, 25.0);
        assert_eq!(snapshot.upstream_failures, 1);
        assert_eq!(snapshot.failed_logins, 1);
        assert_eq!(snapshot.users, 0);
        assert!(snapshot.uptime_seconds >= 0);
    }
}
