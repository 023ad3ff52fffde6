//! Access to the shared work-queue service.
//!
//! The dispatcher, publisher, and heartbeat each talk to the service through
//! [`QueueService`]; production uses Redis list and key commands.

#[cfg(test)]
pub(crate) mod memory;
mod redis_queue;

use std::time::Duration;

pub use redis_queue::{RedisQueue, RedisSettings};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue connection failed: {0}")]
    Connection(String),

    #[error("queue command failed: {0}")]
    Command(String),
}

/// Minimal list/key operations the worker needs (`BRPOP`, `LPUSH`, `SETEX`, `PING`).
pub trait QueueService: Send + Sync {
    /// Blocking pop from the tail of `key`. `Ok(None)` means the wait timed out.
    fn pop(&self, key: &str, timeout: Duration) -> Result<Option<String>, QueueError>;

    /// Push `value` onto the head of `key`.
    fn push(&self, key: &str, value: &str) -> Result<(), QueueError>;

    /// Set `key` to `value`, expiring after `ttl`.
    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), QueueError>;

    /// Connectivity check.
    fn ping(&self) -> Result<(), QueueError>;
}
