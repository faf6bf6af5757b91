use crate::library::logger::interface::Logger;
use log::Level;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub namespace: String,
    pub message: String,
}

/// Records every message in memory so tests can assert on what was logged.
#[derive(Clone, Default)]
pub struct LoggerFake {
    namespace: String,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LoggerFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }

    fn record(&self, level: Level, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            namespace: self.namespace.clone(),
            message: message.to_string(),
        });
    }
}

impl Logger for LoggerFake {
    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        let new_namespace = if self.namespace.is_empty() {
            namespace.to_string()
        } else {
            format!("{}::{}", self.namespace, namespace)
        };

        Arc::new(LoggerFake {
            namespace: new_namespace,
            entries: Arc::clone(&self.entries),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_loggers_share_entries() {
        let logger = LoggerFake::new();
        let child = logger.with_namespace("scheduler").with_namespace("effects");

        child.warn("buffer starved");
        logger.info("started");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].namespace, "scheduler::effects");
        assert!(logger.contains(Level::Warn, "starved"));
        assert!(!logger.contains(Level::Error, "starved"));
    }
}
