#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a typing session over its lifecycle.
///
/// A session starts `running` and is terminalized exactly once into one of
/// the other three states. When the `sea-orm` feature is enabled, this enum
/// can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The attempt is in progress; metrics are not yet recorded.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "running"))]
    Running,
    /// The prompt was fully reproduced and the attempt counts for ranking.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "finished"))]
    Finished,
    /// The attempt ended without completing the prompt.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "expired"))]
    Expired,
    /// Disqualified; recorded but excluded from the leaderboard.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "dq"))]
    Dq,
}

impl SessionStatus {
    /// Returns true once the session can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// All possible status values.
    pub const ALL: &'static [SessionStatus] =
        &[Self::Running, Self::Finished, Self::Expired, Self::Dq];

    /// All terminal statuses.
    pub const TERMINAL: &'static [SessionStatus] = &[Self::Finished, Self::Expired, Self::Dq];

    /// Returns the string representation (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Expired => "expired",
            Self::Dq => "dq",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            SessionStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SessionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "expired" => Ok(Self::Expired),
            "dq" => Ok(Self::Dq),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// Who can see a contest and join it directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "public"))]
    Public,
    /// Joining requires the contest's join code.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "private"))]
    Private,
}

/// When the ranking of a contest is exposed to participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardVisibility {
    /// Visible while the contest is running.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "during"))]
    During,
    /// Visible only after the contest has finished.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "after"))]
    After,
    /// Never exposed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "hidden"))]
    Hidden,
}

/// Input language of a prompt's typing target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "romaji"))]
    Romaji,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "english"))]
    English,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "kana"))]
    Kana,
}

/// Role carried by a verified principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "user"))]
    User,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
}
