use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How many rows the snapshot summary carries.
const TOP_SIZE: usize = 10;

/// One finished session as projected onto the leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub score: i32,
    pub accuracy: f64,
    pub cpm: f64,
    pub ended_at: DateTime<Utc>,
}

/// A leaderboard row with its competition rank.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedSession {
    pub rank: u32,
    #[serde(flatten)]
    pub session: LeaderboardSession,
}

/// The full ranked projection plus the summary the fan-out publishes.
#[derive(Clone, Debug, Serialize)]
pub struct Leaderboard {
    pub ranked: Vec<RankedSession>,
    /// First ten rows, for cheap snapshot payloads.
    pub top: Vec<RankedSession>,
    /// Number of input sessions.
    pub total: usize,
}

/// Sort order: score desc, accuracy desc, cpm desc, then earlier finish wins.
fn compare(a: &LeaderboardSession, b: &LeaderboardSession) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.accuracy.total_cmp(&a.accuracy))
        .then_with(|| b.cpm.total_cmp(&a.cpm))
        .then_with(|| a.ended_at.cmp(&b.ended_at))
}

/// Two rows share a rank iff the entire ordering quadruple is equal.
fn same_rank_key(a: &LeaderboardSession, b: &LeaderboardSession) -> bool {
    a.score == b.score
        && a.accuracy.total_cmp(&b.accuracy).is_eq()
        && a.cpm.total_cmp(&b.cpm).is_eq()
        && a.ended_at == b.ended_at
}

/// Sort the sessions into the total order and assign competition ranks
/// (1, 2, 2, 4): a row tied with its predecessor on the full quadruple
/// inherits its rank, the next distinct row takes its positional rank.
pub fn build_leaderboard(mut sessions: Vec<LeaderboardSession>) -> Leaderboard {
    sessions.sort_by(compare);

    let mut ranked: Vec<RankedSession> = Vec::with_capacity(sessions.len());
    for (position, session) in sessions.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(previous) if same_rank_key(&previous.session, &session) => previous.rank,
            _ => position as u32 + 1,
        };
        ranked.push(RankedSession { rank, session });
    }

    let top = ranked.iter().take(TOP_SIZE).cloned().collect();
    let total = ranked.len();

    Leaderboard { ranked, top, total }
}

/// The caller's own row: first occurrence of the user in ranked order.
///
/// Inputs containing several sessions per user must be deduplicated upstream
/// if "best per user" semantics are wanted.
pub fn extract_personal_rank(ranked: &[RankedSession], user_id: Uuid) -> Option<&RankedSession> {
    ranked.iter().find(|row| row.session.user_id == user_id)
}
