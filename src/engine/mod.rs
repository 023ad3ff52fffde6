//! Matching engines.
//!
//! Two interchangeable strategies sit behind [`MatchingEngine`]:
//! - [`ExternalEngine`]: runs an accelerated search binary and parses its output
//! - [`BruteForceEngine`]: races CPU workers in-process, first match wins

mod brute_force;
mod external;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::str::FromStr;

pub use brute_force::BruteForceEngine;
pub use external::{parse_engine_output, ExternalEngine};

use crate::task::{MatchResult, PatternSpec};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("failed to start engine: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine exited with {status}, output: {output}")]
    ProcessFailed { status: ExitStatus, output: String },

    #[error("could not find private key and address in engine output: {0}")]
    Parse(String),

    #[error("search needs a prefix, a suffix, or both")]
    EmptyPattern,

    #[error("in-process search cannot use a template list")]
    UnsupportedTemplate,

    #[error("all search workers exited without a result")]
    NoResult,
}

/// A strategy that turns a pattern spec into one matching key.
///
/// `search` may block for a long time; callers bound it with their own deadline.
pub trait MatchingEngine: Send + Sync {
    fn search(&self, spec: &PatternSpec) -> Result<MatchResult, EngineError>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Which strategy a process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Delegate to the external accelerated binary
    #[default]
    External,
    /// Search in-process on CPU threads
    Cpu,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "external" | "gpu" | "profanity" => Ok(EngineKind::External),
            "cpu" | "brute-force" | "bruteforce" => Ok(EngineKind::Cpu),
            _ => Err(format!("Unknown engine: {}", s)),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::External => write!(f, "external"),
            EngineKind::Cpu => write!(f, "cpu"),
        }
    }
}
