//! Thread pool behind the brute-force search strategy.
//!
//! This module provides:
//! - CPU workers that each own their candidate state
//! - A one-slot rendezvous so exactly one result is taken per search
//! - A shared stop flag raised the moment that slot is filled

mod cpu;
mod pool;

pub use cpu::{CpuWorker, WorkerStats};
pub use pool::{VanityResult, WorkerPool};
