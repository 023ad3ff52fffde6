//! The `build` command: run the engine directly, no queue involved.

use crate::engine::{EngineError, MatchingEngine};
use crate::task::{MatchResult, PatternSpec};
use crate::upload::Uploader;

/// Searches `repeat` times, uploading each hit when an uploader is set.
///
/// The first engine error stops the run and is returned; results found
/// before it are lost to the caller but were already logged and uploaded.
pub fn run_build(
    engine: &dyn MatchingEngine,
    spec: &PatternSpec,
    repeat: u32,
    uploader: Option<&Uploader>,
) -> Result<Vec<MatchResult>, EngineError> {
    let mut found = Vec::with_capacity(repeat as usize);

    for round in 1..=repeat {
        let result = engine.search(spec)?;
        tracing::info!(
            round,
            of = repeat,
            private_key = %result.private_key,
            address = %result.address,
            total_generated = result.total_generated,
            "address generated"
        );

        if let Some(uploader) = uploader {
            uploader.upload(&result.address, &result.private_key);
        }
        found.push(result);
    }

    Ok(found)
}
