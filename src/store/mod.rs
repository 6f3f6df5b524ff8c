//! Persistence interfaces
//!
//! The authentication subsystem only talks to storage through these traits.
//! Uniqueness of refresh tokens and atomicity of revocation are the store's
//! job (unique index, single-row update), so callers never lock.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;

pub type StorageResult<T> = Result<T, StorageError>;

/// Stored login credential
#[derive(Debug, Clone)]
pub struct Credential {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create credential input
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted refresh token. Only the SHA-256 digest of the token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Valid iff never revoked and `now < expires_at`.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Create refresh token input
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Credential repository trait
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a credential by login identifier (email)
    async fn get_credential_by_identifier(&self, identifier: &str) -> StorageResult<Credential>;

    /// Create a credential; duplicate identifiers fail with `UniqueViolation`
    async fn create_credential(&self, credential: NewCredential) -> StorageResult<Credential>;

    /// Replace identifier and password hash of an existing user
    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Credential>;
}

/// Refresh token repository trait
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(&self, token: NewRefreshToken)
        -> StorageResult<RefreshTokenRecord>;

    async fn get_refresh_token(&self, token_hash: &str) -> StorageResult<RefreshTokenRecord>;

    /// Set `revoked_at` if still unset. Revoking twice succeeds and keeps the
    /// first timestamp.
    async fn revoke_refresh_token(&self, token_hash: &str, at: DateTime<Utc>)
        -> StorageResult<()>;

    /// Revoke every live token of a user, returning how many were revoked
    async fn revoke_user_refresh_tokens(&self, user_id: Uuid, at: DateTime<Utc>)
        -> StorageResult<u64>;
}
