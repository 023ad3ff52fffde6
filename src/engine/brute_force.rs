//! In-process search: a fresh worker pool per call, first match wins.

use crate::matcher::Pattern;
use crate::task::{MatchResult, PatternSpec, Template};
use crate::worker::WorkerPool;

use super::{EngineError, MatchingEngine};

#[derive(Debug, Clone)]
pub struct BruteForceEngine {
    num_workers: usize,
}

impl BruteForceEngine {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }

    fn pattern_for(spec: &PatternSpec) -> Result<Pattern, EngineError> {
        if let Template::List(_) = spec.template {
            return Err(EngineError::UnsupportedTemplate);
        }
        Pattern::new(spec.prefix(), spec.suffix()).map_err(|_| EngineError::EmptyPattern)
    }
}

impl MatchingEngine for BruteForceEngine {
    fn search(&self, spec: &PatternSpec) -> Result<MatchResult, EngineError> {
        let pattern = Self::pattern_for(spec)?;
        tracing::info!(
            workers = self.num_workers,
            prefix = pattern.prefix(),
            suffix = pattern.suffix(),
            kind = %pattern.kind(),
            difficulty = %pattern.difficulty_description(),
            "starting brute-force search"
        );

        let pool = WorkerPool::new(self.num_workers, pattern);
        let found = pool.take_first().ok_or(EngineError::NoResult)?;
        let elapsed = pool.elapsed();

        // Stop flag is already raised; wait for the losers so the count is final.
        let rate = pool.keys_per_second();
        let total = pool.total_keys();
        pool.join();

        tracing::info!(
            worker = found.worker_id,
            address = %found.address,
            keys = total,
            keys_per_second = rate as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "brute-force search matched"
        );

        Ok(MatchResult {
            private_key: found.private_key,
            address: found.address,
            total_generated: i64::try_from(total).unwrap_or(i64::MAX),
        })
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
