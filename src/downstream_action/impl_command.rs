use crate::downstream_action::interface::{ActionOutput, DownstreamAction};
use crate::library::logger::interface::Logger;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

/// Runs an external executable with no arguments and captures its output.
pub struct DownstreamActionCommand {
    program: PathBuf,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DownstreamActionCommand {
    pub fn new(program: PathBuf, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            program,
            logger: logger.with_namespace("downstream_action"),
        }
    }
}

impl DownstreamAction for DownstreamActionCommand {
    fn run(&self) -> Result<ActionOutput, Box<dyn std::error::Error + Send + Sync>> {
        self.logger
            .info(&format!("Running {}...", self.program.display()));

        let output = Command::new(&self.program)
            .output()
            .map_err(|err| format!("failed to run {}: {}", self.program.display(), err))?;

        Ok(ActionOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
