use crate::result_store::interface::{
    format_timestamp, round_to, ResultStore, ScoringResult, StoredResult,
};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keeps results in memory. Can be told to fail writes.
pub struct ResultStoreFake {
    results: Mutex<Vec<ScoringResult>>,
    fail_inserts: AtomicBool,
}

impl ResultStoreFake {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let store = Self::new();
        store.fail_inserts.store(true, Ordering::SeqCst);
        store
    }

    pub fn results(&self) -> Vec<ScoringResult> {
        self.results.lock().clone()
    }
}

/// Shapes a row the way the sqlite store reads it back.
fn stored(id: i64, result: &ScoringResult) -> StoredResult {
    StoredResult {
        id,
        timestamp: format_timestamp(&result.timestamp.naive_local()),
        prediction: round_to(result.score as f64, 5),
        elapsed_time_ms: round_to(result.elapsed_ms, 1),
    }
}

impl Default for ResultStoreFake {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for ResultStoreFake {
    fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn insert(&self, result: &ScoringResult) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err("fake result store refused the write".into());
        }
        self.results.lock().push(result.clone());
        Ok(())
    }

    fn prune(&self, cutoff: NaiveDateTime) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut results = self.results.lock();
        let before = results.len();
        results.retain(|r| r.timestamp.naive_local() >= cutoff);
        Ok(before - results.len())
    }

    fn recent(
        &self,
        limit: usize,
    ) -> Result<Vec<StoredResult>, Box<dyn std::error::Error + Send + Sync>> {
        let results = self.results.lock();
        Ok(results
            .iter()
            .enumerate()
            .rev()
            .take(limit)
            .map(|(index, result)| stored(index as i64 + 1, result))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};

    #[test]
    fn test_prune_matches_sqlite_semantics() {
        let store = ResultStoreFake::new();
        let now = Local::now();
        for age in [20, 1] {
            store
                .insert(&ScoringResult {
                    timestamp: now - Duration::days(age),
                    score: 0.5,
                    elapsed_ms: 1.0,
                })
                .unwrap();
        }

        let deleted = store.prune((now - Duration::days(15)).naive_local()).unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.recent(10).unwrap().len(), 1);
        assert_eq!(
            store.recent(1).unwrap()[0].timestamp,
            format_timestamp(&(now - Duration::days(1)).naive_local())
        );
    }
}
