use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(pub Vec<u8>);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

pub trait FrameSource {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Waits at most `timeout` for the next frame. `Ok(None)` means nothing
    /// arrived in time.
    fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>>;
}
