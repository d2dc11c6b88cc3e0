use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest_prompt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub contest_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub prompt_id: Uuid,
    #[sea_orm(belongs_to, from = "contest_id", to = "id")]
    pub contest: BelongsTo<super::contest::Entity>,
    #[sea_orm(belongs_to, from = "prompt_id", to = "id")]
    pub prompt: BelongsTo<super::prompt::Entity>,

    /// Position within the contest's ordered prompt pool.
    #[sea_orm(default_value = 0)]
    pub order_index: i32,
}

impl ActiveModelBehavior for ActiveModel {}
