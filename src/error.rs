use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("result store: {0}")]
    Store(#[source] BoxError),

    #[error("classifier: {0}")]
    Classifier(#[source] BoxError),

    #[error("frame source: {0}")]
    FrameSource(#[source] BoxError),

    #[error("control surface: {0}")]
    Http(#[source] std::io::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
