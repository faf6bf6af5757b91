use crate::error::Error;
use crate::frame_buffer::FrameBuffer;
use crate::frame_source::interface::FrameSource;
use crate::library::logger::interface::Logger;
use crate::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;

/// Moves frames from the frame source into the frame buffer until shutdown.
pub struct FrameSubscriber {
    logger: Arc<dyn Logger + Send + Sync>,
    frame_source: Arc<dyn FrameSource + Send + Sync>,
    frame_buffer: Arc<FrameBuffer>,
    shutdown: Shutdown,
    poll_timeout: Duration,
}

impl FrameSubscriber {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        frame_source: Arc<dyn FrameSource + Send + Sync>,
        frame_buffer: Arc<FrameBuffer>,
        shutdown: Shutdown,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            logger: logger.with_namespace("frame_subscriber"),
            frame_source,
            frame_buffer,
            shutdown,
            poll_timeout,
        }
    }

    pub fn run(&self) -> Result<(), Error> {
        let result = self.receive_loop();

        if let Err(err) = self.frame_source.stop() {
            self.logger
                .warn(&format!("Failed to stop frame source: {}", err));
        }

        match &result {
            Ok(()) => self.logger.info("Frame subscriber exited gracefully"),
            Err(err) => self
                .logger
                .error(&format!("Frame subscriber exited with error: {}", err)),
        }
        result
    }

    fn receive_loop(&self) -> Result<(), Error> {
        self.frame_source.start().map_err(Error::FrameSource)?;
        self.logger.info("Receiving frames...");

        let mut received: u64 = 0;
        while !self.shutdown.is_triggered() {
            let frame = match self
                .frame_source
                .recv_timeout(self.poll_timeout)
                .map_err(Error::FrameSource)?
            {
                Some(frame) => frame,
                None => continue,
            };

            received += 1;
            if self.frame_buffer.push(frame) {
                self.logger.debug("Frame buffer full, dropped oldest frame");
            }
            if received == 1 {
                self.logger.info("First frame received");
            }
        }
        Ok(())
    }
}
