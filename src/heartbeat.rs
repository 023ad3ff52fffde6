//! Liveness reporter: keeps a TTL marker alive while the worker runs.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::queue::QueueService;

/// Renew period.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Marker expiry; two missed beats and the worker counts as gone.
pub const HEARTBEAT_TTL: Duration = Duration::from_secs(60);

/// Owner handle for the heartbeat thread. Dropping it stops the thread.
pub struct Heartbeat {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Starts beating immediately, then every `interval`.
    pub fn spawn(
        queue: Arc<dyn QueueService>,
        key: impl Into<String>,
        interval: Duration,
        ttl: Duration,
    ) -> Self {
        let key = key.into();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("heartbeat".into())
            .spawn(move || loop {
                if let Err(e) = queue.set_ex(&key, "1", ttl) {
                    tracing::warn!(key = %key, error = %e, "heartbeat update failed");
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("Failed to spawn heartbeat thread");

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.shutdown();
    }
}
