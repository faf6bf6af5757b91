use crate::frame_source::interface::{Frame, FrameSource};
use crate::library::logger::interface::Logger;
use parking_lot::Mutex;
use rand::Rng;
#[cfg(test)]
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

enum FakeFrames {
    Random {
        interval: Duration,
        frame_size: usize,
        next_due: Mutex<Instant>,
    },
    #[cfg(test)]
    Scripted(Mutex<VecDeque<Frame>>),
}

pub struct FrameSourceFake {
    frames: FakeFrames,
    started: AtomicBool,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FrameSourceFake {
    /// Emits a frame of random bytes every `interval`.
    pub fn random(
        interval: Duration,
        frame_size: usize,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            frames: FakeFrames::Random {
                interval,
                frame_size,
                next_due: Mutex::new(Instant::now() + interval),
            },
            started: AtomicBool::new(false),
            logger: logger.with_namespace("frame_source").with_namespace("fake"),
        }
    }

    /// Emits the given frames once, in order, then nothing.
    #[cfg(test)]
    pub fn scripted(frames: Vec<Frame>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            frames: FakeFrames::Scripted(Mutex::new(frames.into())),
            started: AtomicBool::new(false),
            logger: logger.with_namespace("frame_source").with_namespace("fake"),
        }
    }

    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        match &self.frames {
            FakeFrames::Random { .. } => usize::MAX,
            FakeFrames::Scripted(frames) => frames.lock().len(),
        }
    }
}

impl FrameSource for FrameSourceFake {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Starting fake frame source...");
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Stopping fake frame source...");
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>> {
        if !self.started.load(Ordering::SeqCst) {
            return Err("fake frame source not started".into());
        }

        match &self.frames {
            FakeFrames::Random {
                interval,
                frame_size,
                next_due,
            } => {
                let mut next_due = next_due.lock();
                let wait = next_due.saturating_duration_since(Instant::now());
                if wait > timeout {
                    std::thread::sleep(timeout);
                    return Ok(None);
                }
                std::thread::sleep(wait);
                *next_due = Instant::now() + *interval;

                let mut bytes = vec![0u8; *frame_size];
                rand::rng().fill(&mut bytes[..]);
                Ok(Some(Frame(bytes)))
            }
            #[cfg(test)]
            FakeFrames::Scripted(frames) => match frames.lock().pop_front() {
                Some(frame) => Ok(Some(frame)),
                None => {
                    std::thread::sleep(timeout);
                    Ok(None)
                }
            },
        }
    }
}
