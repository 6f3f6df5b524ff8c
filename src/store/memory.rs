//! In-memory store used by tests and local runs without Postgres

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    Credential, CredentialStore, NewCredential, NewRefreshToken, RefreshTokenRecord,
    RefreshTokenStore, StorageResult,
};
use crate::error::StorageError;

#[derive(Default, Clone)]
pub struct InMemoryStore {
    credentials: Arc<DashMap<Uuid, Credential>>,
    by_email: Arc<DashMap<String, Uuid>>,
    refresh_tokens: Arc<DashMap<String, RefreshTokenRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a refresh token record as-is, bypassing the manager
    pub fn insert_refresh_token(&self, record: RefreshTokenRecord) {
        self.refresh_tokens.insert(record.token_hash.clone(), record);
    }

    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn get_credential_by_identifier(&self, identifier: &str) -> StorageResult<Credential> {
        let user_id = *self.by_email.get(identifier).ok_or(StorageError::NotFound)?;
        self.credentials
            .get(&user_id)
            .map(|c| c.value().clone())
            .ok_or(StorageError::NotFound)
    }

    async fn create_credential(&self, credential: NewCredential) -> StorageResult<Credential> {
        match self.by_email.entry(credential.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::UniqueViolation(
                    "credentials.email".to_string(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(credential.user_id);
            }
        }

        let row = Credential {
            user_id: credential.user_id,
            email: credential.email,
            password_hash: credential.password_hash,
            created_at: credential.created_at,
            updated_at: credential.created_at,
        };
        self.credentials.insert(row.user_id, row.clone());
        Ok(row)
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Credential> {
        let mut row = self
            .credentials
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound)?;

        if row.email != email {
            match self.by_email.entry(email.to_string()) {
                Entry::Occupied(_) => {
                    return Err(StorageError::UniqueViolation(
                        "credentials.email".to_string(),
                    ))
                }
                Entry::Vacant(slot) => {
                    slot.insert(user_id);
                }
            }
            self.by_email.remove(&row.email);
            row.email = email.to_string();
        }

        row.password_hash = password_hash.to_string();
        row.updated_at = updated_at;
        Ok(row.clone())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn create_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> StorageResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord {
            token_hash: token.token_hash,
            user_id: token.user_id,
            created_at: token.created_at,
            expires_at: token.expires_at,
            revoked_at: None,
        };

        match self.refresh_tokens.entry(record.token_hash.clone()) {
            Entry::Occupied(_) => Err(StorageError::UniqueViolation(
                "refresh_tokens.token_hash".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get_refresh_token(&self, token_hash: &str) -> StorageResult<RefreshTokenRecord> {
        self.refresh_tokens
            .get(token_hash)
            .map(|r| r.value().clone())
            .ok_or(StorageError::NotFound)
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut record = self
            .refresh_tokens
            .get_mut(token_hash)
            .ok_or(StorageError::NotFound)?;
        if record.revoked_at.is_none() {
            record.revoked_at = Some(at);
        }
        Ok(())
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let mut revoked = 0;
        for mut record in self.refresh_tokens.iter_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
