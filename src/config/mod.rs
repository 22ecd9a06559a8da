//! Configuration loading and management

use crate::core::error::{AppError, AppResult, ConfigError};
use crate::core::validation::validators::username;
use crate::print::LayoutSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Environment variable holding the configuration file path
pub const CONFIG_PATH_ENV: &str = "MATERIAL_ORDER_CONFIG";

/// Configuration file read when the environment variable is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/material-order.yaml";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind (e.g., "127.0.0.1:3000")
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Session cookie settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,

    /// Session lifetime in seconds (default 7 days)
    pub max_age_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-session".to_string(),
            max_age_secs: 60 * 60 * 24 * 7,
        }
    }
}

/// A user allowed to log in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub display_name: String,

    /// Stable identity; generated at startup when absent
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub layout: LayoutSettings,

    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// Seed the store with the standard catalog at startup
    #[serde(default = "default_seed_catalog")]
    pub seed_catalog: bool,
}

fn default_seed_catalog() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AppError::from(e)
            }
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `MATERIAL_ORDER_CONFIG` (or the default path), falling back
    /// to [`AppConfig::default_config`] when the file does not exist
    pub fn load() -> AppResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        match Self::from_yaml_file(&path) {
            Ok(config) => {
                tracing::info!(path = %path, "loaded configuration");
                Ok(config)
            }
            Err(AppError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::warn!(path = %path, "configuration file not found, using defaults");
                Ok(Self::default_config())
            }
            Err(e) => Err(e),
        }
    }

    /// Check value ranges the layout engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if layout.rows_per_column < 2 {
            return Err(invalid(
                "layout.rows_per_column",
                layout.rows_per_column,
                "must be at least 2",
            ));
        }
        if layout.columns_per_page < 1 {
            return Err(invalid(
                "layout.columns_per_page",
                layout.columns_per_page,
                "must be at least 1",
            ));
        }
        if !(-23..=23).contains(&layout.utc_offset_hours) {
            return Err(invalid(
                "layout.utc_offset_hours",
                layout.utc_offset_hours,
                "must be between -23 and 23",
            ));
        }
        if self.session.max_age_secs <= 0 {
            return Err(invalid(
                "session.max_age_secs",
                self.session.max_age_secs,
                "must be positive",
            ));
        }
        for user in &self.users {
            if let Err(err) = username(&user.username) {
                let message = err.message.map(|m| m.to_string()).unwrap_or_default();
                return Err(invalid("users.username", &user.username, &message));
            }
        }
        Ok(())
    }

    /// Create a default configuration for development and testing
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            layout: LayoutSettings::default(),
            users: vec![
                UserConfig {
                    username: "demo".to_string(),
                    password: "Demo1234".to_string(),
                    display_name: "デモ建設".to_string(),
                    id: None,
                },
                UserConfig {
                    username: "guest".to_string(),
                    password: "Guest1234".to_string(),
                    display_name: "ゲスト工業".to_string(),
                    id: None,
                },
            ],
            seed_catalog: true,
        }
    }
}

fn invalid(field: &str, value: impl ToString, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
