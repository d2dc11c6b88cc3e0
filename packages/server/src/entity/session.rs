use engine::types::SessionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One attempt. Created RUNNING with NULL metrics; terminalized exactly once
/// into finished, expired or dq, at which point the metric columns are set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub contest_id: Uuid,
    pub prompt_id: Uuid,

    pub started_at: DateTimeUtc,
    pub ended_at: Option<DateTimeUtc>,
    pub status: SessionStatus,

    pub cpm: Option<f64>,
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    /// Authoritative mistake count from the replay.
    pub errors: Option<i32>,
    pub score: Option<i32>,

    #[sea_orm(default_value = 0)]
    pub defocus_count: i32,
    #[sea_orm(default_value = false)]
    pub paste_blocked: bool,
    pub anomaly_score: Option<f64>,
    /// Comma-joined issue codes; set iff status is dq.
    pub dq_reason: Option<String>,

    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: BelongsTo<super::user::Entity>,
    #[sea_orm(belongs_to, from = "contest_id", to = "id")]
    pub contest: BelongsTo<super::contest::Entity>,
    #[sea_orm(belongs_to, from = "prompt_id", to = "id")]
    pub prompt: BelongsTo<super::prompt::Entity>,
    #[sea_orm(has_many)]
    pub keystrokes: HasMany<super::keystroke::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
