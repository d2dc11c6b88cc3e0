use engine::policy::ContestRules;
use engine::types::{LeaderboardVisibility, PromptLanguage, Visibility};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub visibility: Visibility,
    /// Non-null iff the contest is private.
    pub join_code: Option<String>,

    pub starts_at: DateTimeUtc,
    pub ends_at: DateTimeUtc,
    /// IANA timezone name for display; all scheduling math stays in UTC.
    pub timezone: String,

    /// Per-attempt time limit, 10-600 seconds.
    pub time_limit_sec: i32,
    pub allow_backspace: bool,
    pub leaderboard_visibility: LeaderboardVisibility,
    pub language: PromptLanguage,
    /// NULL means unlimited attempts.
    pub max_attempts: Option<i32>,

    pub created_by: Uuid,
    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub creator: BelongsTo<super::user::Entity>,

    #[sea_orm(has_many, via = "contest_prompt")]
    pub prompts: HasMany<super::prompt::Entity>,
    #[sea_orm(has_many)]
    pub entries: HasMany<super::entry::Entity>,
    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session::Entity>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// The policy view of this contest.
    pub fn rules(&self) -> ContestRules {
        ContestRules {
            visibility: self.visibility,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            leaderboard_visibility: self.leaderboard_visibility,
            max_attempts: self.max_attempts,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
