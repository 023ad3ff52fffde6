//! Jobs, outcomes, and the task classifier.

mod classify;
mod job;

pub use classify::{
    classify_custom, parse_custom_format, ClassificationError, Classifier, PatternSpec, Template,
    FILLER_CHAR, LEADING_CHAR,
};
pub use job::{Job, JobOutcome, MatchResult, OutcomeStatus, TaskType};
