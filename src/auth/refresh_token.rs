/// Refresh Token Management
///
/// Refresh tokens are:
/// - 64 alphanumeric characters from the OS CSPRNG (about 381 bits)
/// - Hashed with SHA-256 before storage (the store never sees plaintext)
/// - Reused until they expire or are revoked (no rotation on refresh)
/// - Revocable individually or per user

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AuthError, StorageError};
use crate::store::{NewRefreshToken, RefreshTokenRecord, RefreshTokenStore};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically secure refresh token
///
/// The token is returned in plaintext; this is what the client keeps.
pub fn generate_refresh_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a refresh token, the only form that is persisted
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn not_found_as_token(err: StorageError) -> AuthError {
    match err {
        StorageError::NotFound => AuthError::TokenNotFound,
        other => AuthError::Storage(other),
    }
}

/// Issues, resolves and revokes refresh tokens on top of a store
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { store }
    }

    /// Issue and persist a new refresh token for `user_id`
    ///
    /// # Errors
    /// - `AuthError::Storage` if the record cannot be saved
    /// - `AuthError::Hashing` if `ttl` overflows the calendar
    pub async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let token = generate_refresh_token();
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Hashing("refresh token lifetime out of range".to_string()))?;

        self.store
            .create_refresh_token(NewRefreshToken {
                token_hash: hash_token(&token),
                user_id,
                created_at: now,
                expires_at,
            })
            .await?;

        tracing::debug!(user_id = %user_id, "Refresh token issued");
        Ok(token)
    }

    /// Look up the record behind a plaintext token
    ///
    /// # Errors
    /// Returns `TokenNotFound` if no record matches
    pub async fn resolve(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.store
            .get_refresh_token(&hash_token(token))
            .await
            .map_err(not_found_as_token)
    }

    /// Resolve a token and check it is usable at `now`
    ///
    /// Revoked and expired tokens get distinct errors for logging; callers
    /// report both as unauthorized.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        let record = self.resolve(token).await?;

        if record.is_revoked() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked);
        }
        if record.is_expired_at(now) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(AuthError::TokenExpired);
        }
        Ok(record.user_id)
    }

    pub async fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Revoke a single refresh token. Revoking twice is not an error.
    ///
    /// # Errors
    /// Returns `TokenNotFound` if no record matches
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.store
            .revoke_refresh_token(&hash_token(token), Utc::now())
            .await
            .map_err(not_found_as_token)
    }

    /// Revoke every live refresh token of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let revoked = self
            .store
            .revoke_user_refresh_tokens(user_id, Utc::now())
            .await?;

        tracing::info!(user_id = %user_id, revoked = revoked, "Refresh tokens revoked for user");
        Ok(revoked)
    }
}
