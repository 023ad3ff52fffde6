//! CPU-based worker for brute-force vanity search.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};

use crate::crypto::Keypair;
use crate::matcher::Pattern;

use super::VanityResult;

/// Keys tried between stop-flag checks.
const BATCH_SIZE: u64 = 64;

/// Counters shared by every worker of one pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total keys generated
    pub keys_generated: AtomicU64,
    /// Matches found, including ones that lost the race
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_keys(&self) -> u64 {
        self.keys_generated.load(Ordering::Relaxed)
    }

    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// A CPU worker that generates and tests keypairs.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    /// The pattern to match against
    pattern: Pattern,
    /// Rendezvous slot; holds at most one result
    result_tx: Sender<VanityResult>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        pattern: Pattern,
        result_tx: Sender<VanityResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            pattern,
            result_tx,
            stop_flag,
            stats,
        }
    }

    /// Runs the worker loop.
    ///
    /// Exits when the stop flag is set, when this worker fills the
    /// rendezvous slot, or when the receiving side is gone.
    pub fn run(&self) {
        while !self.stop_flag.load(Ordering::Relaxed) {
            let mut tried = 0;

            while tried < BATCH_SIZE {
                tried += 1;

                // Each trial owns its candidate; nothing is shared across workers.
                let keypair = Keypair::generate();
                let address = keypair.address().to_base58();
                if !self.pattern.matches(&address) {
                    continue;
                }

                self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                let result = VanityResult {
                    private_key: keypair.private_key_hex(),
                    address,
                    worker_id: self.id,
                };

                match self.result_tx.try_send(result) {
                    Ok(()) => {
                        self.stats.keys_generated.fetch_add(tried, Ordering::Relaxed);
                        self.stop_flag.store(true, Ordering::Relaxed);
                        return;
                    }
                    // Another worker already won.
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        self.stats.keys_generated.fetch_add(tried, Ordering::Relaxed);
                        return;
                    }
                }
            }

            self.stats.keys_generated.fetch_add(tried, Ordering::Relaxed);
        }
    }
}
