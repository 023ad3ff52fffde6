//! Maps a job onto the pattern the matching engine searches for.

use std::path::PathBuf;

use crate::crypto::ADDRESS_LEN;

use super::job::{Job, TaskType};

/// Every Tron address starts with this character.
pub const LEADING_CHAR: char = 'T';

/// Placeholder for unconstrained positions in a constructed skeleton.
pub const FILLER_CHAR: char = 'X';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("custom format must be '<prefix>-<suffix>', e.g. 'TABC-8888': {0:?}")]
    MissingSeparator(String),

    #[error("custom format prefix and suffix must both be non-empty")]
    EmptySide,

    #[error("custom format prefix must start with 'T'")]
    BadLeadingChar,

    #[error("{0:?} never appears in an address")]
    InvalidChar(char),

    #[error("prefix and suffix together are {0} characters, longer than an address")]
    TooLong(usize),

    #[error("template list not found: {}", .0.display())]
    MissingTemplateList(PathBuf),
}

/// What the matching engine is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// A template list on disk, opaque to everything but the external engine
    List(PathBuf),
    /// An address-length skeleton with [`FILLER_CHAR`] in free positions
    Skeleton(String),
}

impl Template {
    /// The `--matching` argument for the external engine.
    pub fn as_arg(&self) -> String {
        match self {
            Template::List(path) => path.display().to_string(),
            Template::Skeleton(skeleton) => skeleton.clone(),
        }
    }
}

/// Normalised search target derived once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    pub prefix_count: usize,
    pub suffix_count: usize,
    pub template: Template,
}

impl PatternSpec {
    /// A skeleton pattern taken from a full template address, as the one-shot
    /// command receives it.
    pub fn from_template(template: impl Into<String>, prefix_count: usize, suffix_count: usize) -> Self {
        Self {
            prefix_count,
            suffix_count,
            template: Template::Skeleton(template.into()),
        }
    }

    /// The constrained leading characters, if the template is a skeleton.
    pub fn prefix(&self) -> Option<&str> {
        match &self.template {
            Template::Skeleton(s) => Some(&s[..char_offset(s, self.prefix_count)]),
            Template::List(_) => None,
        }
    }

    /// The constrained trailing characters, if the template is a skeleton.
    pub fn suffix(&self) -> Option<&str> {
        match &self.template {
            Template::Skeleton(s) => {
                let skip = s.chars().count().saturating_sub(self.suffix_count);
                Some(&s[char_offset(s, skip)..])
            }
            Template::List(_) => None,
        }
    }
}

/// Byte offset of the `n`th character, or the end of `s`.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Whether some casing of `c` is a Base58 digit. Matching ignores case, so
/// only `0` and non-alphanumerics can never match.
fn is_address_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && c != '0'
}

/// Turns jobs into pattern specs.
#[derive(Debug, Clone)]
pub struct Classifier {
    template_list: PathBuf,
}

impl Classifier {
    pub fn new(template_list: impl Into<PathBuf>) -> Self {
        Self {
            template_list: template_list.into(),
        }
    }

    pub fn classify(&self, job: &Job) -> Result<PatternSpec, ClassificationError> {
        if let Some(suffix_count) = job.task_type.fixed_suffix_len() {
            if !self.template_list.exists() {
                return Err(ClassificationError::MissingTemplateList(
                    self.template_list.clone(),
                ));
            }
            return Ok(PatternSpec {
                prefix_count: 0,
                suffix_count,
                template: Template::List(self.template_list.clone()),
            });
        }

        match &job.task_type {
            TaskType::CustomAddress => classify_custom(&job.custom_format),
            other => Err(ClassificationError::UnknownTaskType(other.to_string())),
        }
    }
}

/// Splits `<prefix>-<suffix>` and checks both sides.
pub fn parse_custom_format(format: &str) -> Result<(String, String), ClassificationError> {
    let mut parts = format.split('-');
    let (Some(prefix), Some(suffix), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ClassificationError::MissingSeparator(format.to_string()));
    };

    if prefix.is_empty() || suffix.is_empty() {
        return Err(ClassificationError::EmptySide);
    }
    if !prefix.starts_with(LEADING_CHAR) {
        return Err(ClassificationError::BadLeadingChar);
    }
    if let Some(bad) = prefix.chars().chain(suffix.chars()).find(|c| !is_address_char(*c)) {
        return Err(ClassificationError::InvalidChar(bad));
    }

    Ok((prefix.to_string(), suffix.to_string()))
}

/// Builds the skeleton `prefix + XXXX... + suffix` for a custom address.
pub fn classify_custom(format: &str) -> Result<PatternSpec, ClassificationError> {
    let (prefix, suffix) = parse_custom_format(format)?;
    let prefix_count = prefix.len();
    let suffix_count = suffix.len();

    let used = prefix_count + suffix_count;
    let filler = ADDRESS_LEN
        .checked_sub(used)
        .ok_or(ClassificationError::TooLong(used))?;

    let mut skeleton = String::with_capacity(ADDRESS_LEN);
    skeleton.push_str(&prefix);
    skeleton.extend(std::iter::repeat(FILLER_CHAR).take(filler));
    skeleton.push_str(&suffix);

    Ok(PatternSpec {
        prefix_count,
        suffix_count,
        template: Template::Skeleton(skeleton),
    })
}
