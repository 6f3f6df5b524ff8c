/// Authentication orchestration
///
/// `AuthService` composes the password hasher, the access token codec and
/// the refresh token manager into the flows handlers call:
///
/// ```text
/// Anonymous --login--> Authenticated --refresh--> Refreshed --revoke--> Revoked
/// ```
///
/// Every failure returns immediately; nothing downstream runs on
/// partially-validated data.

use actix_web::http::header::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::auth::extract::{api_key_matches, extract_api_key};
use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::RefreshTokenManager;
use crate::configuration::Settings;
use crate::error::{AuthError, StorageError};
use crate::store::{Credential, CredentialStore, NewCredential, RefreshTokenStore};

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_token: String,
    pub refresh_token: String,
}

/// Digest verified when the identifier is unknown, so both login failure
/// paths pay for one Argon2 run. Computed at most once per process.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("chirpy-dummy-password").ok())
        .as_deref()
}

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: RefreshTokenManager,
    codec: AccessTokenCodec,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    api_key: String,
    dummy_hash: Option<&'static str>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        settings: &Settings,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens: RefreshTokenManager::new(refresh_store),
            codec: AccessTokenCodec::from_settings(&settings.jwt),
            access_token_ttl: settings.jwt.access_token_ttl(),
            refresh_token_ttl: settings.jwt.refresh_token_ttl(),
            api_key: settings.webhook.api_key.clone(),
            dummy_hash: dummy_hash(),
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager {
        &self.refresh_tokens
    }

    /// Create a credential for a new user
    ///
    /// # Errors
    /// - `Storage(UniqueViolation)` if the email is taken
    /// - `Hashing` if the password cannot be hashed
    pub async fn register(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let password_hash = hash_password(password)?;

        let credential = self
            .credentials
            .create_credential(NewCredential {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %credential.user_id, "Credential created");
        Ok(credential)
    }

    /// Anonymous -> Authenticated
    ///
    /// Unknown identifier and wrong password are both `CredentialInvalid`.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let credential = match self.credentials.get_credential_by_identifier(identifier).await {
            Ok(credential) => credential,
            Err(StorageError::NotFound) => {
                if let Some(hash) = self.dummy_hash {
                    let _ = verify_password(password, hash);
                }
                return Err(AuthError::CredentialInvalid);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &credential.password_hash)? {
            return Err(AuthError::CredentialInvalid);
        }

        let access_token = self.codec.mint(credential.user_id, self.access_token_ttl)?;
        let refresh_token = self
            .refresh_tokens
            .issue(credential.user_id, self.refresh_token_ttl)
            .await?;

        tracing::info!(user_id = %credential.user_id, "User logged in");
        Ok(LoginOutcome {
            user_id: credential.user_id,
            email: credential.email,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
            access_token,
            refresh_token,
        })
    }

    /// Authenticated/Refreshed -> Refreshed
    ///
    /// Mints a new access token for the refresh token's owner. The refresh
    /// token itself stays the same.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user_id = self.refresh_tokens.validate(refresh_token).await?;
        let access_token = self.codec.mint(user_id, self.access_token_ttl)?;

        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Any state -> Revoked
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await?;
        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Guard for protected operations: the access token's subject
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        self.codec.verify(access_token)
    }

    /// Replace the email and password of an authenticated user and revoke
    /// their outstanding refresh tokens
    ///
    /// Sessions are revoked before the credential changes, so a storage
    /// failure leaves the user logged out rather than with live sessions
    /// under a new password.
    pub async fn change_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<Credential, AuthError> {
        let password_hash = hash_password(password)?;

        self.refresh_tokens.revoke_all_for_user(user_id).await?;

        let credential = self
            .credentials
            .update_credential(user_id, email, &password_hash, Utc::now())
            .await
            .map_err(|e| match e {
                // the token outlived its user
                StorageError::NotFound => AuthError::CredentialInvalid,
                other => AuthError::Storage(other),
            })?;

        tracing::info!(user_id = %user_id, "Credentials changed");
        Ok(credential)
    }

    /// Guard for service-to-service calls carrying `X-API-Key`
    pub fn authorize_service(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = extract_api_key(headers)?;
        if !api_key_matches(&presented, &self.api_key) {
            tracing::warn!("Rejected service call with wrong API key");
            return Err(AuthError::CredentialInvalid);
        }
        Ok(())
    }
}
