use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::types::{LeaderboardVisibility, Visibility};

/// Participation rules of one contest, borrowed from storage.
///
/// Timestamps are UTC; the contest's display timezone plays no role here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContestRules {
    pub visibility: Visibility,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub leaderboard_visibility: LeaderboardVisibility,
    /// `None` means unlimited attempts.
    pub max_attempts: Option<i32>,
}

/// The slice of an entry the policy needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntrySnapshot {
    pub attempts_used: i32,
}

/// Where a contest stands relative to its scheduled window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Scheduled,
    Running,
    Finished,
}

/// Why a session start was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StartRejection {
    #[error("Contest has not started yet")]
    ContestNotStarted,
    #[error("Contest has ended")]
    ContestFinished,
    #[error("Caller has not joined this contest")]
    NotJoined,
    #[error("Attempt limit reached")]
    AttemptsExhausted,
}

impl StartRejection {
    /// Machine-readable reason code embedded in validation errors.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::ContestNotStarted => "CONTEST_NOT_STARTED",
            Self::ContestFinished => "CONTEST_FINISHED",
            Self::NotJoined => "ENTRY_NOT_FOUND",
            Self::AttemptsExhausted => "ATTEMPTS_EXHAUSTED",
        }
    }
}

pub fn contest_status(rules: &ContestRules, now: DateTime<Utc>) -> ContestStatus {
    if now < rules.starts_at {
        ContestStatus::Scheduled
    } else if now >= rules.ends_at {
        ContestStatus::Finished
    } else {
        ContestStatus::Running
    }
}

/// Whether the leaderboard may be shown to participants at `now`.
pub fn leaderboard_visible(rules: &ContestRules, now: DateTime<Utc>) -> bool {
    match rules.leaderboard_visibility {
        LeaderboardVisibility::During => contest_status(rules, now) == ContestStatus::Running,
        LeaderboardVisibility::After => contest_status(rules, now) == ContestStatus::Finished,
        LeaderboardVisibility::Hidden => false,
    }
}

/// Admission check for starting a new attempt.
pub fn validate_session_start(
    rules: &ContestRules,
    entry: Option<&EntrySnapshot>,
    now: DateTime<Utc>,
) -> Result<(), StartRejection> {
    match contest_status(rules, now) {
        ContestStatus::Scheduled => return Err(StartRejection::ContestNotStarted),
        ContestStatus::Finished => return Err(StartRejection::ContestFinished),
        ContestStatus::Running => {}
    }

    let Some(entry) = entry else {
        return Err(StartRejection::NotJoined);
    };

    if let Some(max_attempts) = rules.max_attempts
        && entry.attempts_used >= max_attempts
    {
        return Err(StartRejection::AttemptsExhausted);
    }

    Ok(())
}

pub fn requires_join_code(rules: &ContestRules) -> bool {
    rules.visibility == Visibility::Private
}

/// Attempts left under the contest cap; `None` when the contest is uncapped.
pub fn remaining_attempts(rules: &ContestRules, entry: Option<&EntrySnapshot>) -> Option<i32> {
    let max_attempts = rules.max_attempts?;
    let used = entry.map(|e| e.attempts_used).unwrap_or(0);
    Some((max_attempts - used).max(0))
}
