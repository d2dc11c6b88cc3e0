use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bounded child of a session: the raw keylog of the latest finish request,
/// at most 2,000 rows, replaced as a unit.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keystroke")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: Uuid,
    /// Dense from 0 in submission order.
    #[sea_orm(primary_key, auto_increment = false)]
    pub idx: i32,
    #[sea_orm(belongs_to, from = "session_id", to = "id")]
    pub session: BelongsTo<super::session::Entity>,

    /// Milliseconds since attempt start, truncated.
    pub t_ms: i64,
    pub key: String,
    /// Client-side correctness hint; telemetry only.
    pub ok: bool,
}

impl ActiveModelBehavior for ActiveModel {}
