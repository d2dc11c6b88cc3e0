use chrono::{DateTime, Utc};
use engine::evaluate::{self, EvaluationContext};
use engine::issue::join_issues;
use engine::leaderboard::LeaderboardSession;
use engine::payload::FinishPayload;
use engine::policy;
use engine::replay::KEYLOG_LIMIT;
use engine::stats::TypingStats;
use engine::types::SessionStatus;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use super::lock_for_update;
use crate::auth::Principal;
use crate::entity::{contest, contest_prompt, entry, keystroke, prompt, session, user};
use crate::error::{AppError, is_unique_violation};
use crate::models::session::{FinishResult, PromptView, StartSessionResult};

/// Transactional orchestration over sessions, entries and keystrokes.
///
/// Every mutating operation runs in a single transaction holding row locks
/// on the participant's entry row (and the session row on finish), so
/// concurrent calls serialize per participant.
#[derive(Clone)]
pub struct TypingStore {
    db: DatabaseConnection,
}

impl TypingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admit a participant into a new attempt.
    ///
    /// Creates the entry lazily, validates admission against the contest
    /// policy, picks the next prompt by cycling through the contest's pool,
    /// creates a RUNNING session and bumps `attempts_used` under the entry
    /// row lock. Two concurrent starts by the same user serialize and see
    /// distinct attempt numbers.
    #[instrument(skip(self), fields(contest_id = %contest_id, user_id = %principal.user_id))]
    pub async fn start_session(
        &self,
        contest_id: Uuid,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<StartSessionResult, AppError> {
        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;

        let contest_model = find_contest(&txn, contest_id).await?;

        let entry_model =
            load_or_create_entry(&txn, backend, principal.user_id, contest_id).await?;

        let rules = contest_model.rules();
        policy::validate_session_start(&rules, Some(&entry_model.snapshot()), now)
            .map_err(|rejection| AppError::Validation(rejection.reason_code().into()))?;

        let pool = contest_prompt::Entity::find()
            .filter(contest_prompt::Column::ContestId.eq(contest_id))
            .find_also_related(prompt::Entity)
            .order_by_asc(contest_prompt::Column::OrderIndex)
            .all(&txn)
            .await?;
        if pool.is_empty() {
            return Err(AppError::NotFound("Contest has no prompts".into()));
        }

        // Fair rotation: cycle through the ordered pool by attempt count.
        let slot = entry_model.attempts_used.rem_euclid(pool.len() as i32) as usize;
        let (_, prompt_model) = &pool[slot];
        let prompt_model = prompt_model
            .clone()
            .ok_or_else(|| AppError::Internal("Contest prompt references missing prompt".into()))?;

        let session_id = Uuid::new_v4();
        let new_session = session::ActiveModel {
            id: Set(session_id),
            user_id: Set(principal.user_id),
            contest_id: Set(contest_id),
            prompt_id: Set(prompt_model.id),
            started_at: Set(now),
            status: Set(SessionStatus::Running),
            defocus_count: Set(0),
            paste_blocked: Set(false),
            ..Default::default()
        };
        new_session.insert(&txn).await?;

        let attempts_used = entry_model.attempts_used + 1;
        let mut active: entry::ActiveModel = entry_model.into();
        active.attempts_used = Set(attempts_used);
        active.last_attempt_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;

        let attempts_remaining = rules.max_attempts.map(|max| Ord::max(max - attempts_used, 0));

        info!(session_id = %session_id, attempts_used, "Session started");

        Ok(StartSessionResult {
            session_id,
            prompt: PromptView {
                id: prompt_model.id,
                display_text: prompt_model.display_text,
                typing_target: prompt_model.typing_target,
            },
            started_at: now,
            attempts_used,
            attempts_remaining,
        })
    }

    /// Terminalize a running session from a client's finish payload.
    ///
    /// Replays the keylog, recomputes the metrics, persists the verdict and
    /// the bounded keystroke buffer, and promotes the entry's best metrics
    /// when the attempt finished and improved on them. A second finish for
    /// the same session fails with `Conflict`.
    #[instrument(skip(self, payload), fields(session_id = %session_id, user_id = %principal.user_id))]
    pub async fn finish_session(
        &self,
        session_id: Uuid,
        principal: &Principal,
        payload: &FinishPayload,
        now: DateTime<Utc>,
    ) -> Result<FinishResult, AppError> {
        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;

        let session_model = lock_for_update(session::Entity::find_by_id(session_id), backend)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        if session_model.user_id != principal.user_id {
            // Reported as NOT_FOUND to avoid confirming foreign session ids.
            return Err(AppError::NotFound("Session not found".into()));
        }
        if session_model.status != SessionStatus::Running {
            return Err(AppError::Conflict("Session already terminalized".into()));
        }

        let contest_model = find_contest(&txn, session_model.contest_id).await?;
        let prompt_model = prompt::Entity::find_by_id(session_model.prompt_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("Session references missing prompt".into()))?;
        let entry_model = lock_for_update(
            entry::Entity::find_by_id((principal.user_id, session_model.contest_id)),
            backend,
        )
        .one(&txn)
        .await?;

        let snapshot = entry_model.as_ref().map(entry::Model::snapshot);
        let ctx = EvaluationContext {
            typing_target: &prompt_model.typing_target,
            allow_backspace: contest_model.allow_backspace,
            time_limit_sec: contest_model.time_limit_sec,
        };
        let evaluation = evaluate::evaluate_session(&ctx, payload, snapshot.as_ref())?;

        let dq_reason = (evaluation.status == SessionStatus::Dq)
            .then(|| join_issues(&evaluation.issues));

        let contest_id = session_model.contest_id;
        let mut active: session::ActiveModel = session_model.into();
        active.status = Set(evaluation.status);
        active.ended_at = Set(Some(now));
        active.cpm = Set(Some(evaluation.stats.cpm));
        active.wpm = Set(Some(evaluation.stats.wpm));
        active.accuracy = Set(Some(evaluation.stats.accuracy));
        active.errors = Set(Some(evaluation.mistakes as i32));
        active.score = Set(Some(evaluation.stats.score));
        active.defocus_count = Set(evaluation.flags.defocus as i32);
        active.paste_blocked = Set(evaluation.flags.paste_blocked);
        active.anomaly_score = Set(evaluation.flags.anomaly_score);
        active.dq_reason = Set(dq_reason.clone());
        active.update(&txn).await?;

        replace_keystrokes(&txn, session_id, payload).await?;

        let mut best_updated = false;
        let mut attempts_used = 0;
        if let Some(entry_model) = entry_model {
            attempts_used = entry_model.attempts_used;
            let current_best = (
                entry_model.best_score,
                entry_model.best_accuracy,
                entry_model.best_cpm,
            );

            let mut active: entry::ActiveModel = entry_model.into();
            active.last_attempt_at = Set(Some(now));
            if evaluation.status == SessionStatus::Finished
                && is_better(current_best, &evaluation.stats)
            {
                active.best_score = Set(Some(evaluation.stats.score));
                active.best_cpm = Set(Some(evaluation.stats.cpm));
                active.best_accuracy = Set(Some(evaluation.stats.accuracy));
                best_updated = true;
            }
            active.update(&txn).await?;
        }

        txn.commit().await?;

        info!(
            status = %evaluation.status,
            score = evaluation.stats.score,
            best_updated,
            "Session finished"
        );

        Ok(FinishResult {
            session_id,
            contest_id,
            status: evaluation.status,
            stats: evaluation.stats,
            errors: evaluation.mistakes,
            issues: evaluation.issues,
            anomaly: evaluation.anomaly,
            flags: evaluation.flags,
            best_updated,
            attempts_used,
            dq_reason,
        })
    }

    /// Read the finished sessions of a contest in leaderboard order.
    ///
    /// Consistent with committed finishes only; feed the result to
    /// `engine::leaderboard::build_leaderboard` for ranking.
    #[instrument(skip(self), fields(contest_id = %contest_id))]
    pub async fn get_leaderboard(
        &self,
        contest_id: Uuid,
        limit: u64,
    ) -> Result<Vec<LeaderboardSession>, AppError> {
        find_contest(&self.db, contest_id).await?;

        let rows = session::Entity::find()
            .filter(session::Column::ContestId.eq(contest_id))
            .filter(session::Column::Status.eq(SessionStatus::Finished))
            .find_also_related(user::Entity)
            .order_by_desc(session::Column::Score)
            .order_by_desc(session::Column::Accuracy)
            .order_by_desc(session::Column::Cpm)
            .order_by_asc(session::Column::EndedAt)
            .limit(Some(limit))
            .all(&self.db)
            .await?;

        let sessions = rows
            .into_iter()
            .map(|(s, u)| LeaderboardSession {
                session_id: s.id,
                user_id: s.user_id,
                username: u.map(|u| u.username).unwrap_or_default(),
                score: s.score.unwrap_or(0),
                accuracy: s.accuracy.unwrap_or(0.0),
                cpm: s.cpm.unwrap_or(0.0),
                // Finished sessions always carry ended_at; started_at is a
                // floor for rows predating that invariant.
                ended_at: s.ended_at.unwrap_or(s.started_at),
            })
            .collect();

        Ok(sessions)
    }
}

/// Lexicographic best-entry comparison: (score desc, accuracy desc, cpm
/// desc). NULLs in the existing best read as negative infinity; a full tie
/// is not an improvement.
fn is_better(
    existing: (Option<i32>, Option<f64>, Option<f64>),
    candidate: &TypingStats,
) -> bool {
    let (best_score, best_accuracy, best_cpm) = existing;
    let best_score = best_score.unwrap_or(i32::MIN);
    let best_accuracy = best_accuracy.unwrap_or(f64::NEG_INFINITY);
    let best_cpm = best_cpm.unwrap_or(f64::NEG_INFINITY);

    match candidate.score.cmp(&best_score) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match candidate.accuracy.total_cmp(&best_accuracy) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                candidate.cpm.total_cmp(&best_cpm) == std::cmp::Ordering::Greater
            }
        },
    }
}

async fn find_contest<C: ConnectionTrait>(
    db: &C,
    contest_id: Uuid,
) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(contest_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}

/// Load the entry under a row lock, creating it on first contact. A losing
/// racer on the insert re-reads the row the winner created.
async fn load_or_create_entry(
    txn: &DatabaseTransaction,
    backend: DbBackend,
    user_id: Uuid,
    contest_id: Uuid,
) -> Result<entry::Model, AppError> {
    let existing = lock_for_update(entry::Entity::find_by_id((user_id, contest_id)), backend)
        .one(txn)
        .await?;
    if let Some(model) = existing {
        return Ok(model);
    }

    let fresh = entry::ActiveModel {
        user_id: Set(user_id),
        contest_id: Set(contest_id),
        attempts_used: Set(0),
        ..Default::default()
    };
    match fresh.insert(txn).await {
        Ok(model) => Ok(model),
        Err(e) if is_unique_violation(&e) => {
            lock_for_update(entry::Entity::find_by_id((user_id, contest_id)), backend)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    AppError::Internal("Entry vanished after unique-key collision".into())
                })
        }
        Err(e) => Err(e.into()),
    }
}

/// Replace the session's keystroke rows with the submitted keylog, truncated
/// to the buffer bound.
async fn replace_keystrokes(
    txn: &DatabaseTransaction,
    session_id: Uuid,
    payload: &FinishPayload,
) -> Result<(), AppError> {
    keystroke::Entity::delete_many()
        .filter(keystroke::Column::SessionId.eq(session_id))
        .exec(txn)
        .await?;

    let rows: Vec<keystroke::ActiveModel> = payload
        .keylog
        .iter()
        .take(KEYLOG_LIMIT)
        .enumerate()
        .map(|(idx, event)| keystroke::ActiveModel {
            session_id: Set(session_id),
            idx: Set(idx as i32),
            t_ms: Set(event.t.trunc() as i64),
            key: Set(event.k.clone()),
            ok: Set(event.ok.unwrap_or(event.k.chars().count() == 1)),
        })
        .collect();

    if !rows.is_empty() {
        keystroke::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}
