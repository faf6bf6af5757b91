use crate::library::logger::interface::Logger;
use chrono::Utc;
use log::Level;
use std::io::Write;
use std::sync::Arc;

const ROOT_NAMESPACE: &str = "frame_sentry";

/// Installs the process-wide `env_logger` backend. `RUST_LOG` takes
/// precedence over `default_level`.
pub fn init(default_level: log::LevelFilter, timezone: chrono::FixedOffset) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.to_string()),
    )
    .format(move |buf, record| {
        let local_time = Utc::now().with_timezone(&timezone);
        let formatted = local_time.format("%Y-%m-%d %I:%M:%S%.3f %p");
        writeln!(
            buf,
            "[{}] {:<5} {}: {}",
            formatted,
            record.level(),
            record.target(),
            record.args()
        )
    })
    .init();
}

#[derive(Debug, Clone, Default)]
pub struct LoggerConsole {
    namespace: Option<String>,
}

impl LoggerConsole {
    pub fn new() -> Self {
        Self { namespace: None }
    }

    fn child(&self, namespace: &str) -> LoggerConsole {
        let current = self.namespace.as_deref().unwrap_or(ROOT_NAMESPACE);
        LoggerConsole {
            namespace: Some(format!("{}::{}", current, namespace)),
        }
    }

    fn log(&self, level: Level, message: &str) {
        let target = self.namespace.as_deref().unwrap_or(ROOT_NAMESPACE);
        log::log!(target: target, level, "{}", message);
    }
}

impl Logger for LoggerConsole {
    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        Arc::new(self.child(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_nest_under_root() {
        let logger = LoggerConsole::new().child("scheduler").child("effects");

        assert_eq!(
            logger.namespace.as_deref(),
            Some("frame_sentry::scheduler::effects")
        );
    }
}
