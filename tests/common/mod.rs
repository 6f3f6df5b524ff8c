use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::AuthService;
use chirpy::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, Settings, WebhookSettings,
};
use chirpy::startup::run;
use chirpy::store::InMemoryStore;

pub const TEST_API_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub store: InMemoryStore,
    pub client: reqwest::Client,
}

pub fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "chirpy_test".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
            issuer: "chirpy".to_string(),
            leeway: 0,
        },
        webhook: WebhookSettings {
            api_key: TEST_API_KEY.to_string(),
        },
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = InMemoryStore::new();
    let auth = AuthService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        &test_settings(),
    );

    let server = run(listener, auth).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/api/users",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Register then log in, returning the login body
    pub async fn register_and_login(&self, email: &str, password: &str) -> serde_json::Value {
        assert_eq!(201, self.register(email, password).await.status().as_u16());
        let response = self
            .post_json(
                "/api/login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse login response")
    }
}
