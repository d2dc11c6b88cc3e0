use chrono::{DateTime, Utc};
use engine::types::{LeaderboardVisibility, PromptLanguage, Visibility};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Allowed bounds for a contest's per-attempt time limit, in seconds.
pub const TIME_LIMIT_RANGE: std::ops::RangeInclusive<i32> = 10..=600;

/// Longest accepted contest title, in characters after trimming.
pub const TITLE_MAX_CHARS: usize = 256;

/// Request body for creating a contest.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateContestRequest {
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    /// Generated when omitted for a private contest; ignored for public ones.
    pub join_code: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub timezone: String,
    pub time_limit_sec: i32,
    pub allow_backspace: bool,
    pub leaderboard_visibility: LeaderboardVisibility,
    pub language: PromptLanguage,
    pub max_attempts: Option<i32>,
}

/// PATCH body for updating a contest. Only provided fields are modified.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UpdateContestRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the code; rejected while the contest is private.
    pub join_code: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub time_limit_sec: Option<i32>,
    pub allow_backspace: Option<bool>,
    pub leaderboard_visibility: Option<LeaderboardVisibility>,
    pub max_attempts: Option<Option<i32>>,
}

/// Full contest details.
#[derive(Clone, Debug, Serialize)]
pub struct ContestResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub join_code: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub timezone: String,
    pub time_limit_sec: i32,
    pub allow_backspace: bool,
    pub leaderboard_visibility: LeaderboardVisibility,
    pub language: PromptLanguage,
    pub max_attempts: Option<i32>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::contest::Model> for ContestResponse {
    fn from(m: crate::entity::contest::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            visibility: m.visibility,
            join_code: m.join_code,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            timezone: m.timezone,
            time_limit_sec: m.time_limit_sec,
            allow_backspace: m.allow_backspace,
            leaderboard_visibility: m.leaderboard_visibility,
            language: m.language,
            max_attempts: m.max_attempts,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

fn validate_contest_title(title: &str) -> Result<(), AppError> {
    match title.trim().chars().count() {
        0 => Err(AppError::Validation("Title must not be empty".into())),
        n if n > TITLE_MAX_CHARS => Err(AppError::Validation(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        ))),
        _ => Ok(()),
    }
}

pub fn validate_create_contest(req: &CreateContestRequest) -> Result<(), AppError> {
    validate_contest_title(&req.title)?;
    if req.ends_at <= req.starts_at {
        return Err(AppError::Validation(
            "ends_at must be after starts_at".into(),
        ));
    }
    if !TIME_LIMIT_RANGE.contains(&req.time_limit_sec) {
        return Err(AppError::Validation(
            "time_limit_sec must be between 10 and 600".into(),
        ));
    }
    if let Some(max_attempts) = req.max_attempts
        && max_attempts < 1
    {
        return Err(AppError::Validation("max_attempts must be >= 1".into()));
    }
    if req.timezone.trim().is_empty() {
        return Err(AppError::Validation("timezone must not be empty".into()));
    }
    Ok(())
}

pub fn validate_update_contest(req: &UpdateContestRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_contest_title(title)?;
    }
    if let (Some(starts_at), Some(ends_at)) = (req.starts_at, req.ends_at)
        && ends_at <= starts_at
    {
        return Err(AppError::Validation(
            "ends_at must be after starts_at".into(),
        ));
    }
    if let Some(time_limit_sec) = req.time_limit_sec
        && !TIME_LIMIT_RANGE.contains(&time_limit_sec)
    {
        return Err(AppError::Validation(
            "time_limit_sec must be between 10 and 600".into(),
        ));
    }
    if let Some(Some(max_attempts)) = req.max_attempts
        && max_attempts < 1
    {
        return Err(AppError::Validation("max_attempts must be >= 1".into()));
    }
    Ok(())
}
