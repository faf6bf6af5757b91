use crate::frame_source::interface::Frame;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded drop-oldest FIFO shared by the subscriber and the scheduler.
///
/// Holds at most `max_len` frames. The scheduler only consumes once at least
/// `min_len` frames are buffered, so a detection always has that many frames
/// of context available.
pub struct FrameBuffer {
    frames: Mutex<VecDeque<Frame>>,
    min_len: usize,
    max_len: usize,
}

impl FrameBuffer {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(max_len)),
            min_len,
            max_len,
        }
    }

    /// Appends `frame`, evicting the oldest frame first when full. Returns
    /// whether a frame was evicted.
    pub fn push(&self, frame: Frame) -> bool {
        let mut frames = self.frames.lock();
        let mut evicted = false;
        while frames.len() >= self.max_len {
            frames.pop_front();
            evicted = true;
        }
        frames.push_back(frame);
        evicted
    }

    /// The `n` oldest frames, left in place.
    pub fn peek_context(&self, n: usize) -> Vec<Frame> {
        self.frames.lock().iter().take(n).cloned().collect()
    }

    /// The frame at `offset`, or `Err(len)` while fewer than `min_len` frames
    /// are buffered.
    pub fn select(&self, offset: usize) -> Result<Frame, usize> {
        let frames = self.frames.lock();
        if frames.len() < self.min_len {
            return Err(frames.len());
        }
        frames.get(offset).cloned().ok_or(frames.len())
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    #[cfg(test)]
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
