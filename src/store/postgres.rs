//! PostgreSQL implementation of the persistence traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    Credential, CredentialStore, NewCredential, NewRefreshToken, RefreshTokenRecord,
    RefreshTokenStore, StorageResult,
};
use crate::error::StorageError;

type CredentialRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);
type RefreshTokenRow = (String, Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>);

fn credential_from_row(row: CredentialRow) -> Credential {
    let (user_id, email, password_hash, created_at, updated_at) = row;
    Credential {
        user_id,
        email,
        password_hash,
        created_at,
        updated_at,
    }
}

fn refresh_token_from_row(row: RefreshTokenRow) -> RefreshTokenRecord {
    let (token_hash, user_id, created_at, expires_at, revoked_at) = row;
    RefreshTokenRecord {
        token_hash,
        user_id,
        created_at,
        expires_at,
        revoked_at,
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn get_credential_by_identifier(&self, identifier: &str) -> StorageResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, email, hashed_password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(credential_from_row(row))
    }

    async fn create_credential(&self, credential: NewCredential) -> StorageResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(credential.user_id)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential_from_row(row))
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(credential_from_row(row))
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> StorageResult<RefreshTokenRecord> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token_hash, user_id, created_at, expires_at, revoked_at
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(refresh_token_from_row(row))
    }

    async fn get_refresh_token(&self, token_hash: &str) -> StorageResult<RefreshTokenRecord> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT token_hash, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(refresh_token_from_row(row))
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        // COALESCE keeps the first revocation time and still matches the row
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $1)
            WHERE token_hash = $2
            "#,
        )
        .bind(at)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1
            WHERE user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
