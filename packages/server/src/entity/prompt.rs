use engine::types::PromptLanguage;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prompt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub language: PromptLanguage,
    /// What the participant sees.
    #[sea_orm(column_type = "Text")]
    pub display_text: String,
    /// The authoritative character sequence the participant must reproduce.
    #[sea_orm(column_type = "Text")]
    pub typing_target: String,
    /// Free-form labels stored as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub is_active: bool,

    #[sea_orm(has_many, via = "contest_prompt")]
    pub contests: HasMany<super::contest::Entity>,
    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
