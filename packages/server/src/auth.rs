use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::types::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A verified caller, as delivered by the transport.
///
/// Token verification and normalization happen entirely outside the core;
/// requests with a missing user id or role never reach it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A refresh token as handed back to the transport after issuance.
#[derive(Clone, Debug, Serialize)]
pub struct IssuedToken {
    pub id: Uuid,
    /// The plaintext secret; only the hash is ever persisted.
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

/// The opaque authentication collaborator.
///
/// Implementations own password hashing and refresh-token lifecycles; the
/// core only defines the seam so the transport can be wired against it.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, plaintext: &str) -> Result<String, AppError>;
    fn verify_password(&self, plaintext: &str, password_hash: &str) -> Result<bool, AppError>;

    async fn issue_refresh_token(&self, user_id: Uuid) -> Result<IssuedToken, AppError>;
    /// Invalidate `presented` and issue a replacement in one step.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
    ) -> Result<IssuedToken, AppError>;
    async fn revoke_refresh_token(&self, user_id: Uuid, presented: &str) -> Result<(), AppError>;
    async fn revoke_all(&self, user_id: Uuid) -> Result<(), AppError>;
}
