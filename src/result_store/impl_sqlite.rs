use crate::library::logger::interface::Logger;
use crate::result_store::interface::{
    format_timestamp, round_to, ResultStore, ScoringResult, StoredResult,
};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS prediction_results (
    id INTEGER PRIMARY KEY,
    timestamp TEXT,
    prediction REAL,
    elapsed_time_ms REAL
);
"#;

pub struct ResultStoreSqlite {
    conn: Mutex<Connection>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ResultStoreSqlite {
    pub fn open(
        path: &Path,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let conn = Connection::open(path)?;
        let logger = logger.with_namespace("result_store");
        logger.info(&format!("Opened result database at {}", path.display()));
        Ok(Self {
            conn: Mutex::new(conn),
            logger,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory(
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            logger: logger.with_namespace("result_store"),
        })
    }
}

impl ResultStore for ResultStoreSqlite {
    fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.conn.lock().execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn insert(&self, result: &ScoringResult) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let timestamp = format_timestamp(&result.timestamp.naive_local());
        self.conn.lock().execute(
            "INSERT INTO prediction_results (timestamp, prediction, elapsed_time_ms) VALUES (?1, ?2, ?3)",
            params![
                timestamp,
                round_to(result.score as f64, 5),
                round_to(result.elapsed_ms, 1)
            ],
        )?;
        self.logger.debug(&format!(
            "Recorded prediction {:.5} at {}",
            result.score, timestamp
        ));
        Ok(())
    }

    fn prune(&self, cutoff: NaiveDateTime) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let deleted = self.conn.lock().execute(
            "DELETE FROM prediction_results WHERE timestamp < ?1",
            params![format_timestamp(&cutoff)],
        )?;
        Ok(deleted)
    }

    fn recent(
        &self,
        limit: usize,
    ) -> Result<Vec<StoredResult>, Box<dyn std::error::Error + Send + Sync>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, prediction, elapsed_time_ms FROM prediction_results
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(StoredResult {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    prediction: row.get(2)?,
                    elapsed_time_ms: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
