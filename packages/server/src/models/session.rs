use chrono::{DateTime, Utc};
use engine::evaluate::SessionFlags;
use engine::issue::Issue;
use engine::replay::IntervalStats;
use engine::stats::TypingStats;
use engine::types::SessionStatus;
use serde::Serialize;
use uuid::Uuid;

/// The prompt slice a participant needs to run an attempt.
#[derive(Clone, Debug, Serialize)]
pub struct PromptView {
    pub id: Uuid,
    pub display_text: String,
    pub typing_target: String,
}

/// Result of a successful start-session call.
#[derive(Clone, Debug, Serialize)]
pub struct StartSessionResult {
    pub session_id: Uuid,
    pub prompt: PromptView,
    pub started_at: DateTime<Utc>,
    pub attempts_used: i32,
    /// `None` for uncapped contests.
    pub attempts_remaining: Option<i32>,
}

/// Result of a finish-session call: the verdict plus entry bookkeeping.
#[derive(Clone, Debug, Serialize)]
pub struct FinishResult {
    pub session_id: Uuid,
    pub contest_id: Uuid,
    pub status: SessionStatus,
    pub stats: TypingStats,
    /// Authoritative mistake count from the replay.
    pub errors: u32,
    pub issues: Vec<Issue>,
    pub anomaly: IntervalStats,
    pub flags: SessionFlags,
    /// Whether this attempt became the entry's new best.
    pub best_updated: bool,
    pub attempts_used: i32,
    pub dq_reason: Option<String>,
}
