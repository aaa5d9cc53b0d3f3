/// What a single submission does to its owner's reputation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReputationChange {
    Merit(u32),
    Foul,
}

/// Scores a vegetation-loss percentage against the configured threshold
#[derive(Clone, Copy, Debug)]
pub struct ReputationPolicy {
    merit_threshold: u32,
}

impl ReputationPolicy {
    pub fn new(merit_threshold: u32) -> Self {
        Self { merit_threshold }
    }

    pub fn merit_threshold(&self) -> u32 {
        self.merit_threshold
    }

    /// Truncated loss at or above the threshold earns that many merit points,
    /// anything below is a foul. Negative loss truncates to zero.
    pub fn evaluate(&self, vegetation_loss_percent: f64) -> ReputationChange {
        // Float-to-int `as` saturates and maps NaN to 0
        let loss = vegetation_loss_percent.trunc() as u32;
        if loss >= self.merit_threshold {
            ReputationChange::Merit(loss)
        } else {
            ReputationChange::Foul
        }
    }
}
