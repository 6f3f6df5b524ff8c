/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation. Refresh and
/// revoke take the refresh token as `Authorization: Bearer <refresh_token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_bearer, AuthService};
use crate::error::AppError;
use crate::routes::users::{validate_email, validate_password, UserResponse};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the user plus access and refresh tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh response carrying only the new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 400: Empty email or password
/// - 401: Unknown email or wrong password (same response for both)
/// - 500: Hashing or storage failure
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;

    let outcome = auth.login(&email, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse {
            id: outcome.user_id.to_string(),
            email: outcome.email,
            created_at: outcome.created_at.to_rfc3339(),
            updated_at: outcome.updated_at.to_rfc3339(),
        },
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: auth.access_token_ttl().num_seconds(),
    }))
}

/// POST /api/refresh
///
/// Mints a new access token. The refresh token is not rotated.
///
/// # Errors
/// - 401: Missing, unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer(req.headers())?;
    let token = auth.refresh(&refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: Missing or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer(req.headers())?;
    auth.revoke(&refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_is_flat() {
        let response = LoginResponse {
            user: UserResponse {
                id: "5d3c0ce4-2b2e-4c36-9a51-1f1f8b7d3a10".to_string(),
                email: "walt@breakingbad.com".to_string(),
                created_at: "2025-01-01T00:00:00+00:00".to_string(),
                updated_at: "2025-01-02T00:00:00+00:00".to_string(),
            },
            token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["email"], "walt@breakingbad.com");
        assert_eq!(json["created_at"], "2025-01-01T00:00:00+00:00");
        assert_eq!(json["updated_at"], "2025-01-02T00:00:00+00:00");
        assert_eq!(json["token"], "access");
        assert!(json.get("user").is_none());
    }
}
