use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set; refusing to start without a signing secret")]
    MissingSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. When absent the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup);

        if config.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // API overrides
        if let Some(v) = lookup("NOTES_API_PORT").or_else(|| lookup("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        self
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment, Environment::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 5000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 5000,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 5000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
            },
        }
    }
}
