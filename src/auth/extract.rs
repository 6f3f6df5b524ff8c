/// Credential extraction from request headers
///
/// Pure parsing, no side effects.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Header carrying the service-to-service API key
pub const API_KEY_HEADER: &str = "X-API-Key";

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of `Authorization: Bearer <token>`
///
/// # Errors
/// Returns `MissingCredential` if the header is absent, not ASCII, uses
/// another scheme or carries an empty token
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token.to_string())
}

/// Pull the API key out of the `X-API-Key` header
///
/// # Errors
/// Returns `MissingCredential` if the header is absent, not ASCII or empty
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, AuthError> {
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    if key.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(key.to_string())
}

/// Exact equality, evaluated in constant time
pub fn api_key_matches(presented: &str, configured: &str) -> bool {
    presented.as_bytes().ct_eq(configured.as_bytes()).into()
}
