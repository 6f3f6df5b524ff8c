/// JWT Token Generation and Validation
///
/// Access tokens are HS256 JWTs checked without any server-side state.
/// Expiry is checked here against an explicit `now` rather than inside
/// jsonwebtoken, which keeps the clock in one place and testable.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::AuthError;

/// Signing keys plus the rules for accepting a token.
///
/// Built once at startup and shared read-only between workers.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    leeway: i64,
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl AccessTokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            leeway: 0,
        }
    }

    pub fn from_settings(config: &JwtSettings) -> Self {
        Self::new(config.secret.as_bytes(), config.issuer.clone()).with_leeway(config.leeway)
    }

    /// Seconds of clock skew tolerated on `iat`
    pub fn with_leeway(mut self, leeway: i64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Mint a token for `subject` that expires `ttl` from now
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` if signing fails
    pub fn mint(&self, subject: Uuid, ttl: Duration) -> Result<String, AuthError> {
        self.mint_at(subject, ttl, Utc::now())
    }

    pub fn mint_at(
        &self,
        subject: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims::new(subject, now, ttl, self.issuer.clone());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Hashing(format!("token signing failed: {}", e)))
    }

    /// Verify a token and return its subject
    ///
    /// # Errors
    /// - `TokenMalformed` if the token does not parse into the expected shape
    /// - `TokenSignatureInvalid` if it was not signed with this key
    /// - `TokenInvalidIssuer` if it was minted by someone else
    /// - `TokenExpired` if `now >= exp`
    /// - `TokenNotYetValid` if `iat` lies in the future beyond the leeway
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        self.verify_claims_at(token, now)?.user_id()
    }

    pub fn verify_claims_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = classify(e.kind());
                tracing::debug!(reason = %e, "JWT validation error");
                err
            })?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        if claims.is_premature_at(now, self.leeway) {
            return Err(AuthError::TokenNotYetValid);
        }
        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature => AuthError::TokenSignatureInvalid,
        ErrorKind::InvalidIssuer => AuthError::TokenInvalidIssuer,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        _ => AuthError::TokenMalformed,
    }
}
