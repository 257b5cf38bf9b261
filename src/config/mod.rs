use once_cell::sync::Lazy;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub secret_key: Option<String>,
    pub publishable_key: Option<String>,
    /// PEM-encoded RSA public key used to verify session tokens
    pub jwt_key: Option<String>,
    pub authorized_parties: Vec<String>,
    pub clock_skew_secs: u64,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub signing_secret: Option<String>,
    pub tolerance_secs: u64,
    pub sync_mode: SyncMode,
}

/// How identity events are applied to the users table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Create inserts, update and delete require the row to exist
    Strict,
    /// Create and update upsert, delete tolerates a missing row
    Idempotent,
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(SyncMode::Strict),
            "idempotent" | "upsert" => Ok(SyncMode::Idempotent),
            other => Err(ConfigError::Invalid {
                key: "IDENTITY_SYNC_MODE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set in production")]
    Required(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (env vars in the binary, maps in tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server overrides
        if let Some(v) = non_empty("HOST") {
            self.server.host = v;
        }
        if let Some(v) = non_empty("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = non_empty("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = non_empty("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = non_empty("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = non_empty("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(v) = non_empty("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = non_empty("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = non_empty("CLERK_SECRET_KEY") {
            self.security.secret_key = Some(v);
        }
        if let Some(v) = non_empty("CLERK_PUBLISHABLE_KEY") {
            self.security.publishable_key = Some(v);
        }
        if let Some(v) = non_empty("CLERK_JWT_KEY") {
            // PEM keys in .env files usually carry escaped newlines
            self.security.jwt_key = Some(v.replace("\\n", "\n"));
        }
        if let Some(v) = lookup("CLERK_AUTHORIZED_PARTIES") {
            self.security.authorized_parties = split_list(&v);
        }
        if let Some(v) = non_empty("AUTH_CLOCK_SKEW_SECS") {
            self.security.clock_skew_secs = v.parse().unwrap_or(self.security.clock_skew_secs);
        }

        // Webhook overrides
        if let Some(v) = non_empty("CLERK_WEBHOOK_SECRET") {
            self.webhook.signing_secret = Some(v);
        }
        if let Some(v) = non_empty("WEBHOOK_TOLERANCE_SECS") {
            self.webhook.tolerance_secs = v.parse().unwrap_or(self.webhook.tolerance_secs);
        }
        if let Some(v) = non_empty("IDENTITY_SYNC_MODE") {
            match v.parse() {
                Ok(mode) => self.webhook.sync_mode = mode,
                Err(e) => tracing::warn!("{}, keeping {:?}", e, self.webhook.sync_mode),
            }
        }

        self
    }

    /// Rejects combinations that are unsafe outside development
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production {
            if self.database.url.is_none() {
                return Err(ConfigError::Required("DATABASE_URL"));
            }
            if self.webhook.signing_secret.is_none() {
                return Err(ConfigError::Required("CLERK_WEBHOOK_SECRET"));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: addr,
        })
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                cors_origins: Vec::new(),
                secret_key: None,
                publishable_key: None,
                jwt_key: None,
                authorized_parties: Vec::new(),
                clock_skew_secs: 5,
            },
            webhook: WebhookConfig {
                signing_secret: None,
                tolerance_secs: 300,
                sync_mode: SyncMode::Idempotent,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 10;
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 512 * 1024;
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
