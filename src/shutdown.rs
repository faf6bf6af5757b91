use crate::library::logger::interface::Logger;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// Process-wide cooperative cancellation. Cloning shares the same flag.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

#[derive(Default)]
struct ShutdownInner {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the flag and wakes every waiter. Returns `false` if it was
    /// already flipped.
    pub fn trigger(&self) -> bool {
        let mut triggered = self.inner.triggered.lock();
        if *triggered {
            return false;
        }
        *triggered = true;
        self.inner.condvar.notify_all();
        true
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.triggered.lock()
    }

    /// Sleeps for up to `timeout`, returning early once shutdown is
    /// triggered. Returns whether shutdown has been triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut triggered = self.inner.triggered.lock();
        if !*triggered {
            self.inner.condvar.wait_for(&mut triggered, timeout);
        }
        *triggered
    }

    pub fn wait(&self) {
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            self.inner.condvar.wait(&mut triggered);
        }
    }
}

/// SIGINT triggers a graceful shutdown. A second SIGINT exits immediately.
pub fn install_signal_handler(
    shutdown: Shutdown,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Result<(), ctrlc::Error> {
    let logger = logger.with_namespace("shutdown");
    ctrlc::set_handler(move || {
        if shutdown.trigger() {
            logger.warn("Shutdown signal received, stopping (repeat to force exit)...");
        } else {
            logger.error("Second shutdown signal received, exiting immediately");
            std::process::exit(130);
        }
    })
}
