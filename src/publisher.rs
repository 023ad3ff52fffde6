//! Pushes job outcomes to the output queue.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::queue::{QueueError, QueueService};
use crate::task::JobOutcome;

/// Push attempts before an outcome is given up on.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize outcome: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: QueueError },
}

/// Best-effort publisher with linear backoff between attempts.
#[derive(Clone)]
pub struct ResultPublisher {
    queue: Arc<dyn QueueService>,
    out_key: String,
    /// Sleep after failed attempt `n` is `n × backoff_unit`
    backoff_unit: Duration,
}

impl ResultPublisher {
    pub fn new(queue: Arc<dyn QueueService>, out_key: impl Into<String>) -> Self {
        Self {
            queue,
            out_key: out_key.into(),
            backoff_unit: Duration::from_secs(1),
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Publishes an outcome. Failures are logged, never returned.
    pub fn publish(&self, outcome: &JobOutcome) {
        match self.try_publish(outcome) {
            Ok(attempts) => tracing::info!(
                task_id = %outcome.task_id,
                status = ?outcome.status,
                queue = %self.out_key,
                attempts,
                "outcome published"
            ),
            Err(e) => tracing::error!(
                task_id = %outcome.task_id,
                queue = %self.out_key,
                error = %e,
                "dropping outcome"
            ),
        }
    }

    /// Publishes with retries and reports how many attempts it took.
    pub fn try_publish(&self, outcome: &JobOutcome) -> Result<u32, PublishError> {
        let payload = serde_json::to_string(outcome)?;

        let mut attempt = 1;
        loop {
            match self.queue.push(&self.out_key, &payload) {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        task_id = %outcome.task_id,
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %e,
                        "push failed, retrying"
                    );
                    thread::sleep(self.backoff_unit * attempt);
                    attempt += 1;
                }
                Err(last) => {
                    return Err(PublishError::Exhausted {
                        attempts: attempt,
                        last,
                    })
                }
            }
        }
    }
}
