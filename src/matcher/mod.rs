//! Pattern matching for Tron addresses.
//!
//! Supports prefix, suffix, and prefix+suffix patterns. Matching is
//! case-insensitive: both the pattern and the candidate are lower-cased.

mod pattern;

pub use pattern::{Pattern, PatternError, PatternType};
