//! # tron_vanity
//!
//! Queue-driven Tron vanity address worker.
//!
//! ## Architecture
//!
//! - `dispatcher`: Pulls jobs, enforces the per-job deadline, publishes outcomes
//! - `task`: Job/outcome wire types and the task classifier
//! - `engine`: External binary adapter and in-process brute-force search
//! - `worker`: Thread pool behind the brute-force search
//! - `crypto`: Key generation and address derivation
//! - `matcher`: Prefix/suffix matching
//! - `queue`, `publisher`, `heartbeat`: Queue service access
//! - `upload`, `oneshot`: The direct `build` command
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod engine;
pub mod heartbeat;
pub mod matcher;
pub mod oneshot;
pub mod publisher;
pub mod queue;
pub mod task;
pub mod upload;
pub mod worker;

pub use config::Config;
pub use crypto::{generate_keypair, Address, Keypair};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherSettings, JobError};
pub use engine::{BruteForceEngine, EngineError, EngineKind, ExternalEngine, MatchingEngine};
pub use matcher::{Pattern, PatternType};
pub use publisher::ResultPublisher;
pub use task::{Classifier, Job, JobOutcome, MatchResult, PatternSpec};
pub use worker::{VanityResult, WorkerPool};
