/// Configuration management for Comment Service
///
/// Loads configuration from environment variables. Optional knobs fall back to
/// defaults when unset or unparsable; choices that change behaviour (backend,
/// CORS in production, pagination bounds) are validated.
use crate::domain::models::PageRequest;
use anyhow::{bail, Context, Result};
use db_pool::{parse_env_flag, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection
    pub storage: StorageConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Page window defaults and bounds
    pub pagination: PaginationConfig,
    /// New-comment notification channel
    pub notifications: NotificationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Required for the postgres backend
    pub database_url: Option<String>,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl PaginationConfig {
    /// Build a page window from optional query parameters, capping the limit.
    pub fn request(&self, limit: Option<u32>, offset: Option<u32>) -> PageRequest {
        PageRequest::new(
            limit.unwrap_or(self.default_limit).min(self.max_limit),
            offset.unwrap_or(0),
        )
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_page_limit() -> u32 {
    10
}

fn default_max_page_limit() -> u32 {
    100
}

fn default_channel_capacity() -> usize {
    256
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_with_default("APP_PORT", 8080),
        };

        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value
                .parse::<StorageBackend>()
                .map_err(anyhow::Error::msg)
                .context("Invalid STORAGE_BACKEND")?,
            // DB_STORE=true is the older switch for the relational backend
            Err(_) if parse_env_flag("DB_STORE", false) => StorageBackend::Postgres,
            Err(_) => StorageBackend::Memory,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        if backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if app.is_production() => {
                    bail!("CORS_ALLOWED_ORIGINS must be set in production")
                }
                Err(_) => format!("http://localhost:{}", app.port),
            };

            if app.is_production() && allowed_origins.trim() == "*" {
                bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
            }

            CorsConfig { allowed_origins }
        };

        let pagination = PaginationConfig {
            default_limit: parse_env_with_default("PAGINATION_DEFAULT_LIMIT", default_page_limit()),
            max_limit: parse_env_with_default("PAGINATION_MAX_LIMIT", default_max_page_limit()),
        };
        if pagination.default_limit > pagination.max_limit {
            bail!(
                "PAGINATION_DEFAULT_LIMIT ({}) exceeds PAGINATION_MAX_LIMIT ({})",
                pagination.default_limit,
                pagination.max_limit
            );
        }

        let notifications = NotificationConfig {
            channel_capacity: parse_env_with_default(
                "NOTIFICATION_CHANNEL_CAPACITY",
                default_channel_capacity(),
            ),
        };

        Ok(Config {
            app,
            storage: StorageConfig {
                backend,
                database_url,
            },
            cors,
            pagination,
            notifications,
        })
    }
}
