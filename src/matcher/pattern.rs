//! Pattern matching implementation.

/// Which ends of the address a pattern constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    /// Match at the beginning of the address
    Prefix,
    /// Match at the end of the address
    Suffix,
    /// Match both prefix and suffix
    PrefixAndSuffix,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Prefix => write!(f, "prefix"),
            PatternType::Suffix => write!(f, "suffix"),
            PatternType::PrefixAndSuffix => write!(f, "prefix+suffix"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Pattern needs a prefix, a suffix, or both")]
    Empty,
}

/// A compiled, case-insensitive address pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Lower-cased prefix, empty when unconstrained
    prefix: String,
    /// Lower-cased suffix, empty when unconstrained
    suffix: String,
    kind: PatternType,
}

impl Pattern {
    /// Builds a pattern from an optional prefix and suffix.
    ///
    /// Empty strings count as absent. At least one side must be present.
    pub fn new(prefix: Option<&str>, suffix: Option<&str>) -> Result<Self, PatternError> {
        let prefix = prefix.unwrap_or_default().to_ascii_lowercase();
        let suffix = suffix.unwrap_or_default().to_ascii_lowercase();

        let kind = match (prefix.is_empty(), suffix.is_empty()) {
            (false, true) => PatternType::Prefix,
            (true, false) => PatternType::Suffix,
            (false, false) => PatternType::PrefixAndSuffix,
            (true, true) => return Err(PatternError::Empty),
        };

        Ok(Self {
            prefix,
            suffix,
            kind,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn kind(&self) -> PatternType {
        self.kind
    }

    /// Tests a Base58 address, ignoring ASCII case.
    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        let candidate = address.as_bytes();
        match self.kind {
            PatternType::Prefix => starts_with_ignore_case(candidate, &self.prefix),
            PatternType::Suffix => ends_with_ignore_case(candidate, &self.suffix),
            PatternType::PrefixAndSuffix => {
                starts_with_ignore_case(candidate, &self.prefix)
                    && ends_with_ignore_case(candidate, &self.suffix)
            }
        }
    }

    /// Rough number of attempts before a match.
    ///
    /// Case folding leaves about 34 distinct symbols per position. The
    /// leading `t` is fixed for every Tron address and costs nothing.
    pub fn estimated_difficulty(&self) -> u64 {
        let fixed = usize::from(self.prefix.starts_with('t'));
        let free = (self.prefix.len() + self.suffix.len()).saturating_sub(fixed);
        34u64.saturating_pow(free as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        match self.estimated_difficulty() {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

#[inline]
fn starts_with_ignore_case(candidate: &[u8], prefix: &str) -> bool {
    candidate
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

#[inline]
fn ends_with_ignore_case(candidate: &[u8], suffix: &str) -> bool {
    candidate
        .len()
        .checked_sub(suffix.len())
        .is_some_and(|start| candidate[start..].eq_ignore_ascii_case(suffix.as_bytes()))
}
