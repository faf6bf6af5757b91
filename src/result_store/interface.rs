use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Outcome of one classifier invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    pub timestamp: DateTime<Local>,
    pub score: f32,
    pub elapsed_ms: f64,
}

/// A row as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: i64,
    pub timestamp: String,
    pub prediction: f64,
    pub elapsed_time_ms: f64,
}

pub trait ResultStore {
    fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn insert(&self, result: &ScoringResult) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Deletes every row stamped before `cutoff` and returns how many went.
    fn prune(&self, cutoff: NaiveDateTime) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;
    /// Newest first.
    fn recent(&self, limit: usize)
        -> Result<Vec<StoredResult>, Box<dyn std::error::Error + Send + Sync>>;
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456789, 5), 0.12346);
        assert_eq!(round_to(41.26, 1), 41.3);
        assert_eq!(round_to(1.0, 5), 1.0);
    }

    #[test]
    fn test_format_timestamp_sorts_lexically() {
        let earlier = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 5)
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(format_timestamp(&earlier), "2024-01-09T23:59:59.000005");
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
