/// User Routes
///
/// Registration, credential change and the current user lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_bearer, AuthService};
use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::store::Credential;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_PASSWORD_LENGTH: usize = 1024;

/// Registration and credential change request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never includes the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Credential> for UserResponse {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.user_id.to_string(),
            email: credential.email,
            created_at: credential.created_at.to_rfc3339(),
            updated_at: credential.updated_at.to_rfc3339(),
        }
    }
}

pub(crate) fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !trimmed.contains('@') {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }
    Ok(trimmed.to_lowercase())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or empty password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;

    let credential = auth.register(&email, &form.password).await?;

    Ok(HttpResponse::Created().json(UserResponse::from(credential)))
}

/// PUT /api/users
///
/// **Requires a valid access token.** Replaces email and password and
/// revokes the user's refresh tokens.
pub async fn update_user(
    req: HttpRequest,
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let access_token = extract_bearer(req.headers())?;
    let user_id = auth.authenticate(&access_token)?;

    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;

    let credential = auth.change_credentials(user_id, &email, &form.password).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(credential)))
}

/// GET /api/me
///
/// The JWT middleware has already verified the token.
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "user_id": user.0.to_string() }))
}
