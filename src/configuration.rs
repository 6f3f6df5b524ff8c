use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub webhook: WebhookSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (3600 = one hour)
    pub refresh_token_expiry: i64,  // seconds (5184000 = 60 days)
    pub issuer: String,
    /// Tolerated clock skew in seconds when checking `iat`
    #[serde(default)]
    pub leeway: i64,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret_length", &self.secret.len())
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl JwtSettings {
    pub const MIN_SECRET_LENGTH: usize = 32;
    /// Upper bound for token lifetimes and leeway (ten years)
    pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_expiry)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                Self::MIN_SECRET_LENGTH
            )));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.access_token_expiry > Self::MAX_LIFETIME_SECONDS
            || self.refresh_token_expiry > Self::MAX_LIFETIME_SECONDS
        {
            return Err(ConfigError::InvalidValue(format!(
                "token lifetimes must not exceed {} seconds",
                Self::MAX_LIFETIME_SECONDS
            )));
        }
        if self.leeway < 0 || self.leeway > Self::MAX_LIFETIME_SECONDS {
            return Err(ConfigError::InvalidValue(
                "jwt.leeway must be between 0 and the maximum lifetime".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service-to-service webhook settings
#[derive(serde::Deserialize, Clone)]
pub struct WebhookSettings {
    pub api_key: String,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        if self.webhook.api_key.is_empty() {
            return Err(ConfigError::MissingRequired("webhook.api_key".to_string()));
        }
        Ok(())
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP__*` env vars,
/// e.g. `APP__JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
            issuer: "chirpy".to_string(),
            leeway: 0,
        }
    }

    #[test]
    fn test_valid_jwt_settings() {
        assert!(jwt().validate().is_ok());
        assert_eq!(jwt().access_token_ttl(), chrono::Duration::hours(1));
        assert_eq!(jwt().refresh_token_ttl(), chrono::Duration::days(60));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = jwt();
        config.secret = "too-short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_non_positive_expiry_rejected() {
        let mut config = jwt();
        config.access_token_expiry = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        let mut config = jwt();
        config.refresh_token_expiry = 10_000_000_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = jwt();
        config.access_token_expiry = JwtSettings::MAX_LIFETIME_SECONDS + 1;
        assert!(config.validate().is_err());

        let mut config = jwt();
        config.refresh_token_expiry = JwtSettings::MAX_LIFETIME_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_leeway_bounds() {
        let mut config = jwt();
        config.leeway = -1;
        assert!(config.validate().is_err());
        config.leeway = i64::MAX;
        assert!(config.validate().is_err());
        config.leeway = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", jwt());
        assert!(!rendered.contains("test-secret"));
    }
}
