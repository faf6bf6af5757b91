use crate::frame_source::interface::{Frame, FrameSource};
use crate::library::logger::interface::Logger;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Subscribes to every topic on a ZeroMQ publisher. Each message is one frame.
pub struct FrameSourceZmq {
    context: Arc<zmq::Context>,
    endpoint: String,
    receive_high_water_mark: i32,
    socket: Mutex<Option<zmq::Socket>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FrameSourceZmq {
    pub fn new(
        endpoint: &str,
        receive_high_water_mark: i32,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self::with_context(
            Arc::new(zmq::Context::new()),
            endpoint,
            receive_high_water_mark,
            logger,
        )
    }

    pub fn with_context(
        context: Arc<zmq::Context>,
        endpoint: &str,
        receive_high_water_mark: i32,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            context,
            endpoint: endpoint.to_string(),
            receive_high_water_mark,
            socket: Mutex::new(None),
            logger: logger.with_namespace("frame_source").with_namespace("zmq"),
        }
    }
}

impl FrameSource for FrameSourceZmq {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut socket_guard = self.socket.lock();
        if socket_guard.is_some() {
            return Err("frame source already started".into());
        }

        self.logger
            .info(&format!("Connecting to publisher endpoint {}", self.endpoint));

        let socket = self.context.socket(zmq::SUB)?;
        socket.set_linger(0)?;
        socket.set_rcvhwm(self.receive_high_water_mark)?;
        socket.connect(&self.endpoint)?;
        socket.set_subscribe(b"")?;

        *socket_guard = Some(socket);

        self.logger.info("Connected to endpoint");
        Ok(())
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.socket.lock().take().is_some() {
            self.logger.info("Disconnected from endpoint");
        }
        Ok(())
    }

    fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>> {
        let socket_guard = self.socket.lock();
        let socket = match socket_guard.as_ref() {
            Some(socket) => socket,
            None => return Err("frame source not started".into()),
        };

        let poll_items = &mut [socket.as_poll_item(zmq::POLLIN)];
        match zmq::poll(poll_items, timeout.as_millis() as i64) {
            Ok(_) => {}
            // A signal arrived mid-poll; the caller re-checks shutdown.
            Err(zmq::Error::EINTR) => return Ok(None),
            Err(e) => return Err(Box::new(e)),
        }

        if !poll_items[0].is_readable() {
            return Ok(None);
        }

        match socket.recv_bytes(0) {
            Ok(bytes) => Ok(Some(Frame(bytes))),
            Err(zmq::Error::EINTR) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}
