use crate::downstream_action::interface::{ActionOutput, DownstreamAction};
use crate::library::logger::interface::Logger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct DownstreamActionFake {
    invocations: AtomicUsize,
    #[cfg(test)]
    fail: bool,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DownstreamActionFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            #[cfg(test)]
            fail: false,
            logger: logger.with_namespace("downstream_action").with_namespace("fake"),
        }
    }
}

#[cfg(test)]
impl DownstreamActionFake {
    pub fn failing(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            fail: true,
            ..Self::new(logger)
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl DownstreamAction for DownstreamActionFake {
    fn run(&self) -> Result<ActionOutput, Box<dyn std::error::Error + Send + Sync>> {
        let n = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        self.logger.info(&format!("Triggered (#{})", n));
        #[cfg(test)]
        if self.fail {
            return Err("fake downstream action failure".into());
        }
        Ok(ActionOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
