/// JWT Claims structure
///
/// Payload of an access token: who it is for, when it was minted,
/// when it stops being accepted and who minted it (RFC 7519 names).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `user_id` minted at `issued_at` and valid for `ttl`
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration, issuer: String) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            exp: iat.saturating_add(ttl.num_seconds()),
            iat,
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenMalformed` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenMalformed)
    }

    /// Expired once `now >= exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Minted in the future, beyond the tolerated skew
    pub fn is_premature_at(&self, now: DateTime<Utc>, leeway: i64) -> bool {
        self.iat > now.timestamp().saturating_add(leeway)
    }
}
