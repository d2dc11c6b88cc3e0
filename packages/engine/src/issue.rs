use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable findings produced while validating a finish request.
///
/// Issues are accumulated as a set: replay sanitation problems, metric
/// discrepancies and anti-cheat signals all land here. Only the codes in
/// [`Issue::DISQUALIFYING`] force a `dq` verdict; the rest are surfaced to
/// the caller for review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    /// A keystroke carried a non-finite timestamp and was skipped.
    InvalidTimestamp,
    /// A keystroke carried a negative timestamp and was skipped.
    NegativeTimestamp,
    /// Timestamps went backwards; replay clamps to the running maximum.
    TimestampNotSorted,
    /// More than the allowed number of keystrokes were submitted.
    KeyLimitExceeded,
    /// Reported metrics disagree with the authoritative replay.
    MetricMismatch,
    /// Reported error count is off by more than the tolerance.
    ErrorCountMismatch,
    /// The typing target was not fully reproduced.
    PromptNotCompleted,
    /// Backspace was used in a contest that forbids it.
    BackspaceForbidden,
    /// The recorded duration exceeds the contest time limit plus slack.
    TimeLimitExceeded,
    /// Inter-keystroke variance is implausibly low for a human.
    LowVarianceTyping,
    /// No entry exists for the participant in this contest.
    EntryNotFound,
}

impl Issue {
    /// Issues that force a `dq` verdict regardless of completion.
    pub const DISQUALIFYING: &'static [Issue] = &[
        Self::MetricMismatch,
        Self::KeyLimitExceeded,
        Self::BackspaceForbidden,
    ];

    pub const ALL: &'static [Issue] = &[
        Self::InvalidTimestamp,
        Self::NegativeTimestamp,
        Self::TimestampNotSorted,
        Self::KeyLimitExceeded,
        Self::MetricMismatch,
        Self::ErrorCountMismatch,
        Self::PromptNotCompleted,
        Self::BackspaceForbidden,
        Self::TimeLimitExceeded,
        Self::LowVarianceTyping,
        Self::EntryNotFound,
    ];

    pub fn is_disqualifying(&self) -> bool {
        Self::DISQUALIFYING.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::NegativeTimestamp => "NEGATIVE_TIMESTAMP",
            Self::TimestampNotSorted => "TIMESTAMP_NOT_SORTED",
            Self::KeyLimitExceeded => "KEY_LIMIT_EXCEEDED",
            Self::MetricMismatch => "METRIC_MISMATCH",
            Self::ErrorCountMismatch => "ERROR_COUNT_MISMATCH",
            Self::PromptNotCompleted => "PROMPT_NOT_COMPLETED",
            Self::BackspaceForbidden => "BACKSPACE_FORBIDDEN",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::LowVarianceTyping => "LOW_VARIANCE_TYPING",
            Self::EntryNotFound => "ENTRY_NOT_FOUND",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid issue code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssueError {
    invalid: String,
}

impl fmt::Display for ParseIssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid issue code '{}'", self.invalid)
    }
}

impl std::error::Error for ParseIssueError {}

impl FromStr for Issue {
    type Err = ParseIssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|issue| issue.as_str() == s)
            .copied()
            .ok_or_else(|| ParseIssueError {
                invalid: s.to_string(),
            })
    }
}

/// Render an issue set the way it is persisted on a disqualified session.
pub fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
