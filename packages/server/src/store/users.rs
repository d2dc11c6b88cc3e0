use chrono::{DateTime, Utc};
use engine::types::Role;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, is_unique_violation};

/// Input for creating a user. The password arrives pre-hashed from the auth
/// collaborator; the core never sees plaintext.
#[derive(Clone, Debug)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[instrument(skip(db, req), fields(username = %req.username))]
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    req: CreateUserRequest,
    now: DateTime<Utc>,
) -> Result<user::Model, AppError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "Username must be 1-64 characters".into(),
        ));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Email must be valid".into()));
    }

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(req.password_hash),
        role: Set(req.role),
        created_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(model) => Ok(model),
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::Conflict("Username or email already taken".into()))
        }
        Err(e) => Err(e.into()),
    }
}
