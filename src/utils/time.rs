use chrono::{NaiveDate, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    current_timestamp_millis() / 1000
}

pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Date sent to the analyzer with each submission
#[derive(Clone, Copy, Debug)]
pub enum ObservationDate {
    Today,
    Fixed(NaiveDate),
}

impl ObservationDate {
    pub fn from_config(fixed: Option<NaiveDate>) -> Self {
        fixed.map_or(ObservationDate::Today, ObservationDate::Fixed)
    }

    pub fn resolve(&self) -> NaiveDate {
        match self {
            ObservationDate::Today => Utc::now().date_naive(),
            ObservationDate::Fixed(date) => *date,
        }
    }
}
