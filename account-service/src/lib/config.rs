use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub tokens: TokenConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    /// Scheme used when building the activation and reset links
    /// (the host comes from the inbound request).
    pub public_scheme: String,
}

/// Per-family signing secrets and lifetimes. Each family has its own
/// secret so a leaked low-security secret cannot forge the others.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub activation_secret: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub password_reset_secret: String,

    pub activation_ttl_hours: i64,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_hours: i64,
    pub password_reset_ttl_minutes: i64,
}

impl TokenConfig {
    pub fn secrets(&self) -> auth::TokenSecrets {
        auth::TokenSecrets {
            activation: self.activation_secret.clone(),
            access: self.access_secret.clone(),
            refresh: self.refresh_secret.clone(),
            password_reset: self.password_reset_secret.clone(),
        }
    }

    pub fn lifetimes(&self) -> auth::TokenLifetimes {
        auth::TokenLifetimes {
            activation: Duration::hours(self.activation_ttl_hours),
            access: Duration::minutes(self.access_ttl_minutes),
            refresh: Duration::hours(self.refresh_ttl_hours),
            password_reset: Duration::minutes(self.password_reset_ttl_minutes),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender_name: String,
    pub sender_address: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, TOKENS__ACCESS_SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }

    /// Reject a deployment with an unusable token setup before serving
    /// a single request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = [
            ("tokens.activation_secret", &self.tokens.activation_secret),
            ("tokens.access_secret", &self.tokens.access_secret),
            ("tokens.refresh_secret", &self.tokens.refresh_secret),
            (
                "tokens.password_reset_secret",
                &self.tokens.password_reset_secret,
            ),
        ];

        for (key, value) in secrets {
            if value.is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }

        if self.server.public_scheme != "http" && self.server.public_scheme != "https" {
            return Err(ConfigError::Message(
                "server.public_scheme must be http or https".to_string(),
            ));
        }

        Ok(())
    }
}
