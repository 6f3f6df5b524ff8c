mod common;

use common::{spawn_app, TEST_API_KEY};
use serde_json::{json, Value};

/// Error body with the per-request fields removed
fn stable_error_body(mut body: Value) -> Value {
    if let Some(map) = body.as_object_mut() {
        map.remove("error_id");
        map.remove("timestamp");
    }
    body
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_for_valid_credentials() {
    let app = spawn_app();

    let response = app.register("walt@breakingbad.com", "123456").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "walt@breakingbad.com");
    assert!(body.get("id").is_some());
    assert!(body.get("password").is_none());
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.register("walt@breakingbad.com", "123456").await.status().as_u16());
    let response = app.register("WALT@breakingbad.com", "other").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_ENTRY");
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();

    let cases = vec![("", "123456"), ("not-an-email", "123456"), ("walt@breakingbad.com", "")];
    for (email, password) in cases {
        let response = app.register(email, password).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject email={:?} password={:?}",
            email,
            password
        );
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_tokens_for_valid_credentials() {
    let app = spawn_app();

    let body = app.register_and_login("walt@breakingbad.com", "123456").await;

    assert_eq!(body["email"], "walt@breakingbad.com");
    assert!(body["id"].is_string());
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_string());
    assert!(body.get("user").is_none());
    assert!(body.get("hashed_password").is_none());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);
    assert_eq!(app.store.refresh_token_count(), 1);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456").await;

    let wrong_password = app
        .post_json("/api/login", &json!({ "email": "walt@breakingbad.com", "password": "654321" }))
        .await;
    let unknown_email = app
        .post_json("/api/login", &json!({ "email": "jesse@breakingbad.com", "password": "123456" }))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(stable_error_body(wrong_password), stable_error_body(unknown_email));
}

// --- Access Token Tests ---

#[tokio::test]
async fn me_requires_a_valid_access_token() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;
    let token = login["token"].as_str().unwrap();

    let response = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], login["id"]);

    let missing = app.client.get(app.url("/api/me")).send().await.unwrap();
    assert_eq!(401, missing.status().as_u16());

    let wrong_scheme = app
        .client
        .get(app.url("/api/me"))
        .header("Authorization", format!("Token {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(401, wrong_scheme.status().as_u16());
}

#[tokio::test]
async fn tampered_access_token_is_rejected() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;
    let token = login["token"].as_str().unwrap();

    let tampered = format!("{}X", token);
    let response = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(&tampered)
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn refresh_token_is_not_accepted_as_access_token() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;

    let response = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(login["refresh_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
}

// --- Refresh / Revoke Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;

    let response = app
        .post_bearer("/api/refresh", login["refresh_token"].as_str().unwrap())
        .await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    let me = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, me.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_unknown_and_missing_tokens() {
    let app = spawn_app();

    let unknown = app.post_bearer("/api/refresh", "not-a-real-refresh-token").await;
    assert_eq!(401, unknown.status().as_u16());

    let missing = app.client.post(app.url("/api/refresh")).send().await.unwrap();
    assert_eq!(401, missing.status().as_u16());
}

#[tokio::test]
async fn revoked_refresh_token_cannot_refresh() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let revoke = app.post_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, revoke.status().as_u16());

    // revoking again is harmless
    let again = app.post_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, again.status().as_u16());

    let refresh = app.post_bearer("/api/refresh", refresh_token).await;
    assert_eq!(401, refresh.status().as_u16());
}

// --- Credential Change Tests ---

#[tokio::test]
async fn update_user_changes_credentials_and_revokes_refresh_tokens() {
    let app = spawn_app();
    let login = app.register_and_login("walt@breakingbad.com", "123456").await;

    let response = app
        .client
        .put(app.url("/api/users"))
        .bearer_auth(login["token"].as_str().unwrap())
        .json(&json!({ "email": "heisenberg@breakingbad.com", "password": "bluecrystal" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "heisenberg@breakingbad.com");

    let refresh = app
        .post_bearer("/api/refresh", login["refresh_token"].as_str().unwrap())
        .await;
    assert_eq!(401, refresh.status().as_u16());

    let old_login = app
        .post_json("/api/login", &json!({ "email": "walt@breakingbad.com", "password": "123456" }))
        .await;
    assert_eq!(401, old_login.status().as_u16());

    let new_login = app
        .post_json(
            "/api/login",
            &json!({ "email": "heisenberg@breakingbad.com", "password": "bluecrystal" }),
        )
        .await;
    assert_eq!(200, new_login.status().as_u16());
}

#[tokio::test]
async fn update_user_requires_access_token() {
    let app = spawn_app();

    let response = app
        .client
        .put(app.url("/api/users"))
        .json(&json!({ "email": "walt@breakingbad.com", "password": "123456" }))
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
}

// --- Webhook API Key Tests ---

#[tokio::test]
async fn webhook_requires_matching_api_key() {
    let app = spawn_app();
    let body = json!({ "event": "user.upgraded", "data": { "user_id": "x" } });

    let missing = app.post_json("/api/polka/webhooks", &body).await;
    assert_eq!(401, missing.status().as_u16());

    let wrong = app
        .client
        .post(app.url("/api/polka/webhooks"))
        .header("X-API-Key", "wrong-key")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(401, wrong.status().as_u16());

    let accepted = app
        .client
        .post(app.url("/api/polka/webhooks"))
        .header("X-API-Key", TEST_API_KEY)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(204, accepted.status().as_u16());
}
