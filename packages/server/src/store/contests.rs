use chrono::{DateTime, Utc};
use engine::types::Visibility;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use super::lock_for_update;
use crate::entity::{contest, contest_prompt, entry, keystroke, prompt, session};
use crate::error::AppError;
use crate::models::contest::{
    CreateContestRequest, UpdateContestRequest, validate_create_contest, validate_update_contest,
};
use crate::utils::join_code::generate_join_code;

/// Administrative operations over contests.
///
/// Authorization happens at the transport; these functions trust the caller.
#[derive(Clone)]
pub struct ContestStore {
    db: DatabaseConnection,
}

impl ContestStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a contest. A private contest without a join code gets a
    /// generated one, keeping the private-implies-join-code invariant.
    #[instrument(skip(self, req), fields(title = %req.title))]
    pub async fn create_contest(
        &self,
        req: CreateContestRequest,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<contest::Model, AppError> {
        validate_create_contest(&req)?;

        let join_code = match req.visibility {
            Visibility::Private => Some(
                req.join_code
                    .filter(|code| !code.trim().is_empty())
                    .unwrap_or_else(generate_join_code),
            ),
            Visibility::Public => None,
        };

        let new_contest = contest::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            visibility: Set(req.visibility),
            join_code: Set(join_code),
            starts_at: Set(req.starts_at),
            ends_at: Set(req.ends_at),
            timezone: Set(req.timezone),
            time_limit_sec: Set(req.time_limit_sec),
            allow_backspace: Set(req.allow_backspace),
            leaderboard_visibility: Set(req.leaderboard_visibility),
            language: Set(req.language),
            max_attempts: Set(req.max_attempts),
            created_by: Set(created_by),
            created_at: Set(now),
            ..Default::default()
        };

        let model = new_contest.insert(&self.db).await?;
        info!(contest_id = %model.id, "Contest created");
        Ok(model)
    }

    /// Partially update a contest using PATCH semantics. Cross-field time
    /// validation runs against the stored values when only one bound moves.
    #[instrument(skip(self, req), fields(contest_id = %id))]
    pub async fn update_contest(
        &self,
        id: Uuid,
        req: UpdateContestRequest,
    ) -> Result<contest::Model, AppError> {
        validate_update_contest(&req)?;

        if req == UpdateContestRequest::default() {
            return find_contest(&self.db, id).await;
        }

        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;
        let existing = find_contest_for_update(&txn, backend, id).await?;

        let effective_start = req.starts_at.unwrap_or(existing.starts_at);
        let effective_end = req.ends_at.unwrap_or(existing.ends_at);
        if effective_end <= effective_start {
            return Err(AppError::Validation(
                "ends_at must be after starts_at".into(),
            ));
        }

        let visibility = existing.visibility;
        let mut active: contest::ActiveModel = existing.into();

        if let Some(ref title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(join_code) = req.join_code {
            let join_code = join_code.filter(|code| !code.trim().is_empty());
            match (visibility, &join_code) {
                (Visibility::Private, None) => {
                    return Err(AppError::Validation(
                        "A private contest must keep a join code".into(),
                    ));
                }
                (Visibility::Public, Some(_)) => {
                    return Err(AppError::Validation(
                        "Only private contests carry a join code".into(),
                    ));
                }
                _ => active.join_code = Set(join_code),
            }
        }
        if let Some(starts_at) = req.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = req.ends_at {
            active.ends_at = Set(ends_at);
        }
        if let Some(time_limit_sec) = req.time_limit_sec {
            active.time_limit_sec = Set(time_limit_sec);
        }
        if let Some(allow_backspace) = req.allow_backspace {
            active.allow_backspace = Set(allow_backspace);
        }
        if let Some(leaderboard_visibility) = req.leaderboard_visibility {
            active.leaderboard_visibility = Set(leaderboard_visibility);
        }
        if let Some(max_attempts) = req.max_attempts {
            active.max_attempts = Set(max_attempts);
        }

        let model = active.update(&txn).await?;
        txn.commit().await?;

        Ok(model)
    }

    /// Delete a contest and everything hanging off it, innermost first:
    /// keystrokes, sessions, entries, prompt links, then the contest row.
    #[instrument(skip(self), fields(contest_id = %id))]
    pub async fn delete_contest(&self, id: Uuid) -> Result<(), AppError> {
        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;
        find_contest_for_update(&txn, backend, id).await?;

        let session_ids: Vec<Uuid> = session::Entity::find()
            .filter(session::Column::ContestId.eq(id))
            .select_only()
            .column(session::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if !session_ids.is_empty() {
            keystroke::Entity::delete_many()
                .filter(keystroke::Column::SessionId.is_in(session_ids))
                .exec(&txn)
                .await?;
        }
        session::Entity::delete_many()
            .filter(session::Column::ContestId.eq(id))
            .exec(&txn)
            .await?;
        entry::Entity::delete_many()
            .filter(entry::Column::ContestId.eq(id))
            .exec(&txn)
            .await?;
        contest_prompt::Entity::delete_many()
            .filter(contest_prompt::Column::ContestId.eq(id))
            .exec(&txn)
            .await?;
        contest::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(contest_id = %id, "Contest deleted");
        Ok(())
    }

    /// Replace the contest's ordered prompt set as a whole; `order_index`
    /// follows array position.
    #[instrument(skip(self, prompt_ids), fields(contest_id = %contest_id, count = prompt_ids.len()))]
    pub async fn replace_contest_prompts(
        &self,
        contest_id: Uuid,
        prompt_ids: Vec<Uuid>,
    ) -> Result<(), AppError> {
        if prompt_ids.is_empty() {
            return Err(AppError::Validation(
                "A contest needs at least one prompt".into(),
            ));
        }
        let mut seen = std::collections::HashSet::with_capacity(prompt_ids.len());
        if let Some(dup) = prompt_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::Validation(format!(
                "Prompt {dup} appears more than once"
            )));
        }

        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;
        find_contest_for_update(&txn, backend, contest_id).await?;

        let known: Vec<Uuid> = prompt::Entity::find()
            .filter(prompt::Column::Id.is_in(prompt_ids.clone()))
            .select_only()
            .column(prompt::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        let known: std::collections::HashSet<Uuid> = known.into_iter().collect();
        let missing: Vec<Uuid> = prompt_ids
            .iter()
            .filter(|id| !known.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Prompts not found: {missing:?}"
            )));
        }

        contest_prompt::Entity::delete_many()
            .filter(contest_prompt::Column::ContestId.eq(contest_id))
            .exec(&txn)
            .await?;

        let links: Vec<contest_prompt::ActiveModel> = prompt_ids
            .iter()
            .enumerate()
            .map(|(i, prompt_id)| contest_prompt::ActiveModel {
                contest_id: Set(contest_id),
                prompt_id: Set(*prompt_id),
                order_index: Set(i as i32),
            })
            .collect();
        contest_prompt::Entity::insert_many(links).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}

async fn find_contest<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}

async fn find_contest_for_update(
    txn: &DatabaseTransaction,
    backend: DbBackend,
    id: Uuid,
) -> Result<contest::Model, AppError> {
    lock_for_update(contest::Entity::find_by_id(id), backend)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}
