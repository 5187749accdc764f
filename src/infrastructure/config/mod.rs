use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};

pub const ENV_PREFIX: &str = "CHEMEQUIP_";
pub const CONFIG_PATH_ENV: &str = "CHEMEQUIP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "chemequip.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub buffer_capacity: usize,
}

/// A user allowed through the gateway. Passwords are stored as SHA-256 hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub password_sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                max_upload_bytes: 5 * 1024 * 1024,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                database_file: "chemequip.db".to_string(),
            },
            retention: RetentionConfig { capacity: 5 },
            logging: LoggingConfig {
                level: "info".to_string(),
                buffer_capacity: 100,
            },
            auth: AuthConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file named by `CHEMEQUIP_CONFIG` (or
    /// `chemequip.toml`), then `CHEMEQUIP_*` environment variables.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention.capacity == 0 {
            return Err(AppError::ConfigError(
                "retention.capacity must be at least 1".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(
                "server.max_upload_bytes must be positive".to_string(),
            ));
        }
        for user in &self.auth.users {
            let valid_hash = user.password_sha256.len() == 64
                && user.password_sha256.chars().all(|c| c.is_ascii_hexdigit());
            if !valid_hash {
                return Err(AppError::ConfigError(format!(
                    "auth user '{}' needs a 64-character hex password_sha256",
                    user.username
                )));
            }
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database_file)
    }
}
