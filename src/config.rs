use crate::error::Error;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_BUFFER_LEN: usize = 1 << 16;
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: String,
    /// `None` logs in the machine's local offset.
    pub utc_offset_hours: Option<i32>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            utc_offset_hours: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameSourceConfig {
    Zmq {
        endpoint: String,
        #[serde(default = "default_receive_high_water_mark")]
        receive_high_water_mark: i32,
    },
    Fake {
        interval_ms: u64,
        frame_size: usize,
    },
}

fn default_receive_high_water_mark() -> i32 {
    1000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    pub poll_timeout_ms: u64,
    pub source: FrameSourceConfig,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 500,
            source: FrameSourceConfig::Zmq {
                endpoint: "tcp://127.0.0.1:4242".to_string(),
                receive_high_water_mark: default_receive_high_water_mark(),
            },
        }
    }
}

impl SubscriberConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub min_len: usize,
    /// Defaults to twice `min_len` when left out.
    pub max_len: Option<usize>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            min_len: 16,
            max_len: None,
        }
    }
}

impl BufferConfig {
    pub fn max_len(&self) -> usize {
        self.max_len
            .unwrap_or_else(|| self.min_len.checked_mul(2).unwrap_or(usize::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub prediction_interval_secs: f64,
    pub tick_ms: u64,
    pub starvation_backoff_ms: u64,
    pub cooldown_ms: u64,
    pub detection_threshold: f32,
    pub frame_offset: usize,
    pub input_file_path: PathBuf,
    pub context_dir: PathBuf,
    pub context_file_prefix: String,
    pub context_file_extension: String,
    pub latency_window: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            prediction_interval_secs: 600.0,
            tick_ms: 100,
            starvation_backoff_ms: 5_000,
            cooldown_ms: 90_000,
            detection_threshold: 0.5,
            frame_offset: 3,
            input_file_path: PathBuf::from("/tmp/frame_to_score.jpg"),
            context_dir: PathBuf::from("/tmp"),
            context_file_prefix: "frame".to_string(),
            context_file_extension: "jpg".to_string(),
            latency_window: 256,
        }
    }
}

impl SchedulerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn starvation_backoff(&self) -> Duration {
        Duration::from_millis(self.starvation_backoff_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn context_file_path(&self, index: usize) -> PathBuf {
        self.context_dir.join(format!(
            "{}{}.{}",
            self.context_file_prefix, index, self.context_file_extension
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OnnxModelConfig {
    pub model_path: PathBuf,
    /// `[width, height]`
    pub target_image_size: (u32, u32),
    #[serde(default = "default_layout")]
    pub layout: TensorLayout,
    #[serde(default = "default_pixel_scale")]
    pub pixel_scale: f32,
    #[serde(default)]
    pub letterbox: bool,
}

fn default_layout() -> TensorLayout {
    TensorLayout::Nhwc
}

fn default_pixel_scale() -> f32 {
    1.0 / 255.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    Onnx(OnnxModelConfig),
    Fake,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig::Onnx(OnnxModelConfig {
            model_path: PathBuf::from("model.onnx"),
            target_image_size: (224, 224),
            layout: default_layout(),
            pixel_scale: default_pixel_scale(),
            letterbox: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownstreamConfig {
    Command { program: PathBuf },
    Fake,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        DownstreamConfig::Command {
            program: PathBuf::from("./on_detected.sh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("predict.sqlite"),
            retention_days: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub listen: SocketAddr,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 4386)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logger: LoggerConfig,
    pub subscriber: SubscriberConfig,
    pub buffer: BufferConfig,
    pub scheduler: SchedulerConfig,
    pub classifier: ClassifierConfig,
    pub downstream: DownstreamConfig,
    pub store: StoreConfig,
    pub control: ControlConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let min_len = self.buffer.min_len;
        let max_len = self.buffer.max_len();

        if min_len == 0 {
            return Err(Error::Config("buffer.min_len must be at least 1".into()));
        }
        if max_len > MAX_BUFFER_LEN {
            return Err(Error::Config(format!(
                "buffer.max_len ({}) must not exceed {}",
                max_len, MAX_BUFFER_LEN
            )));
        }
        if max_len < min_len {
            return Err(Error::Config(format!(
                "buffer.max_len ({}) must not be smaller than buffer.min_len ({})",
                max_len, min_len
            )));
        }
        if self.scheduler.frame_offset >= min_len {
            return Err(Error::Config(format!(
                "scheduler.frame_offset ({}) must be smaller than buffer.min_len ({})",
                self.scheduler.frame_offset, min_len
            )));
        }
        if self.scheduler.tick_ms == 0 {
            return Err(Error::Config("scheduler.tick_ms must be at least 1".into()));
        }
        if !self.scheduler.prediction_interval_secs.is_finite() {
            return Err(Error::Config(
                "scheduler.prediction_interval_secs must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.scheduler.detection_threshold) {
            return Err(Error::Config(
                "scheduler.detection_threshold must be within [0, 1]".into(),
            ));
        }
        if self.subscriber.poll_timeout_ms == 0 {
            return Err(Error::Config(
                "subscriber.poll_timeout_ms must be at least 1".into(),
            ));
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.store.retention_days) {
            return Err(Error::Config(format!(
                "store.retention_days must be within [0, {}], got {}",
                MAX_RETENTION_DAYS, self.store.retention_days
            )));
        }
        self.log_level()?;
        self.log_timezone()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<log::LevelFilter, Error> {
        self.logger
            .level
            .parse()
            .map_err(|_| Error::Config(format!("unknown log level '{}'", self.logger.level)))
    }

    pub fn log_timezone(&self) -> Result<chrono::FixedOffset, Error> {
        match self.logger.utc_offset_hours {
            Some(hours) => hours
                .checked_mul(3600)
                .and_then(chrono::FixedOffset::east_opt)
                .ok_or_else(|| {
                    Error::Config(format!("logger.utc_offset_hours out of range: {}", hours))
                }),
            None => Ok(*chrono::Local::now().offset()),
        }
    }
}
