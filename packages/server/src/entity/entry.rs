use engine::policy::EntrySnapshot;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-(user, contest) aggregate: attempts used and the best finished
/// attempt. The best-* columns are all NULL until the first finished session
/// and thereafter always reflect the best attempt under the lexicographic
/// order (score desc, accuracy desc, cpm desc).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub contest_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: BelongsTo<super::user::Entity>,
    #[sea_orm(belongs_to, from = "contest_id", to = "id")]
    pub contest: BelongsTo<super::contest::Entity>,

    /// Count of sessions ever started, any terminal status included.
    #[sea_orm(default_value = 0)]
    pub attempts_used: i32,

    pub best_score: Option<i32>,
    pub best_cpm: Option<f64>,
    pub best_accuracy: Option<f64>,
    pub last_attempt_at: Option<DateTimeUtc>,
}

impl Model {
    /// The policy view of this entry.
    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            attempts_used: self.attempts_used,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
