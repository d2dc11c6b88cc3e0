use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine::leaderboard::{self, Leaderboard, RankedSession};
use engine::payload::FinishPayload;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::session::{FinishResult, StartSessionResult};
use crate::realtime::{LeaderboardSnapshot, SnapshotPublisher, leaderboard_channel};
use crate::store::typing::TypingStore;

/// The typing store plus the real-time fan-out, wired the way the transport
/// consumes them.
///
/// Publishing happens strictly after the finish transaction commits; a
/// failed publish is logged and never rolls anything back.
#[derive(Clone)]
pub struct TypingService {
    store: TypingStore,
    publisher: Arc<dyn SnapshotPublisher>,
    leaderboard_limit: u64,
}

/// A leaderboard projection together with the caller's own row.
#[derive(Clone, Debug, serde::Serialize)]
pub struct LeaderboardView {
    pub leaderboard: Leaderboard,
    pub personal_rank: Option<RankedSession>,
}

impl TypingService {
    pub fn new(
        store: TypingStore,
        publisher: Arc<dyn SnapshotPublisher>,
        leaderboard_limit: u64,
    ) -> Self {
        Self {
            store,
            publisher,
            leaderboard_limit,
        }
    }

    pub async fn start_session(
        &self,
        contest_id: Uuid,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<StartSessionResult, AppError> {
        self.store.start_session(contest_id, principal, now).await
    }

    /// Finish a session and fan the refreshed leaderboard out to subscribers.
    #[instrument(skip(self, payload), fields(session_id = %session_id))]
    pub async fn finish_session(
        &self,
        session_id: Uuid,
        principal: &Principal,
        payload: &FinishPayload,
        now: DateTime<Utc>,
    ) -> Result<FinishResult, AppError> {
        let result = self
            .store
            .finish_session(session_id, principal, payload, now)
            .await?;

        // Best-effort: the DB write is committed, subscribers catch up later
        // if this fails.
        if let Err(e) = self.publish_snapshot(result.contest_id, now).await {
            warn!(contest_id = %result.contest_id, error = %e, "Leaderboard publish failed");
        }

        Ok(result)
    }

    /// Rank the contest's finished sessions, extracting the caller's row
    /// when a user id is given.
    pub async fn leaderboard_view(
        &self,
        contest_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<LeaderboardView, AppError> {
        let sessions = self
            .store
            .get_leaderboard(contest_id, self.leaderboard_limit)
            .await?;
        let board = leaderboard::build_leaderboard(sessions);
        let personal_rank = user_id
            .and_then(|id| leaderboard::extract_personal_rank(&board.ranked, id))
            .cloned();

        Ok(LeaderboardView {
            leaderboard: board,
            personal_rank,
        })
    }

    async fn publish_snapshot(
        &self,
        contest_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let sessions = self
            .store
            .get_leaderboard(contest_id, self.leaderboard_limit)
            .await?;
        let board = leaderboard::build_leaderboard(sessions);

        let snapshot = LeaderboardSnapshot {
            contest_id,
            top: board.top,
            total: board.total,
            generated_at: now,
        };

        self.publisher
            .publish(&leaderboard_channel(contest_id), &snapshot)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
