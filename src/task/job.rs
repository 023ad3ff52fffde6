//! Wire types for jobs taken from the input queue and outcomes pushed back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of address a job asks for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskType {
    /// `5a`: five trailing characters from the template list
    FiveA,
    /// `6a`
    SixA,
    /// `7a`
    SevenA,
    /// `8a`
    EightA,
    /// `custom_address`: caller supplied `<prefix>-<suffix>`
    CustomAddress,
    /// Anything else. Kept so the classifier can name it in its error.
    Unknown(String),
}

impl TaskType {
    /// Suffix length for the fixed-digit types.
    pub fn fixed_suffix_len(&self) -> Option<usize> {
        match self {
            TaskType::FiveA => Some(5),
            TaskType::SixA => Some(6),
            TaskType::SevenA => Some(7),
            TaskType::EightA => Some(8),
            TaskType::CustomAddress | TaskType::Unknown(_) => None,
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "5a" => TaskType::FiveA,
            "6a" => TaskType::SixA,
            "7a" => TaskType::SevenA,
            "8a" => TaskType::EightA,
            "custom_address" => TaskType::CustomAddress,
            _ => TaskType::Unknown(value),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::FiveA => write!(f, "5a"),
            TaskType::SixA => write!(f, "6a"),
            TaskType::SevenA => write!(f, "7a"),
            TaskType::EightA => write!(f, "8a"),
            TaskType::CustomAddress => write!(f, "custom_address"),
            TaskType::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// A job as decoded from the input queue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Opaque identifier echoed back in the outcome
    pub task_id: String,
    pub task_type: TaskType,
    /// `<prefix>-<suffix>`, only read for `custom_address`
    #[serde(default)]
    pub custom_format: String,
}

impl Job {
    /// Decodes a raw queue payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// A found key and an estimate of how many candidates were tried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub private_key: String,
    pub address: String,
    /// Estimated, not exact
    pub total_generated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Completed,
    Failed,
}

/// The single reply published for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub task_id: String,
    pub status: OutcomeStatus,
    /// Zero-valued on failure
    pub result: MatchResult,
}

impl JobOutcome {
    pub fn completed(task_id: impl Into<String>, result: MatchResult) -> Self {
        Self {
            task_id: task_id.into(),
            status: OutcomeStatus::Completed,
            result,
        }
    }

    pub fn failed(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: OutcomeStatus::Failed,
            result: MatchResult::default(),
        }
    }
}
