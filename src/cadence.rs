use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CadenceError {
    #[error("could not convert string to float: '{0}'")]
    NotANumber(String),
    #[error("prediction_interval must be a finite number of seconds, got {0}")]
    NotFinite(f64),
}

/// Seconds between scoring cycles, shared between the control surface
/// (writer) and the scheduler (reader).
#[derive(Clone, Debug)]
pub struct Cadence {
    seconds_bits: Arc<AtomicU64>,
}

impl Cadence {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds_bits: Arc::new(AtomicU64::new(seconds.to_bits())),
        }
    }

    pub fn seconds(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::SeqCst))
    }

    /// Negative cadences mean "no wait".
    pub fn as_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.seconds().max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn set(&self, seconds: f64) -> Result<f64, CadenceError> {
        if !seconds.is_finite() {
            return Err(CadenceError::NotFinite(seconds));
        }
        self.seconds_bits.store(seconds.to_bits(), Ordering::SeqCst);
        Ok(seconds)
    }

    /// Parses `raw` and replaces the cadence. On error the current value is
    /// kept.
    pub fn set_from_str(&self, raw: &str) -> Result<f64, CadenceError> {
        let seconds = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CadenceError::NotANumber(raw.to_string()))?;
        self.set(seconds)
    }
}
