#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ActionOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait DownstreamAction {
    /// Runs to completion. An `Err` means the action could not be started at all.
    fn run(&self) -> Result<ActionOutput, Box<dyn std::error::Error + Send + Sync>>;
}
