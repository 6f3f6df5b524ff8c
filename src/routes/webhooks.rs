use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthService;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub event: String,
}

/// POST /api/polka/webhooks
///
/// Only the API-key gate lives here; acting on the event belongs to the
/// billing side. The key is checked before the body is looked at.
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    auth.authorize_service(req.headers())?;

    match serde_json::from_slice::<WebhookEvent>(&body) {
        Ok(event) => tracing::info!(event = %event.event, "Webhook accepted"),
        Err(_) => tracing::info!(bytes = body.len(), "Webhook accepted without event"),
    }
    Ok(HttpResponse::NoContent().finish())
}
