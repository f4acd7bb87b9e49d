//! Configuration management

use crate::error::{ErrorContext, TaskdeckError, TaskdeckResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_BASE_URL_ENV: &str = "TASKDECK_API_BASE_URL";

/// Base URL used when neither the config file nor the environment supplies one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskdeckConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where and how to reach the identity and resource endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL shared by `/auth/*` and `/api/*`
    pub base_url: String,
    /// Per-request deadline in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: format!("taskdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session persistence and navigation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the bearer token as plain text
    pub token_file: PathBuf,
    /// Path the application navigates to when the session ends
    pub login_path: String,
    /// Shortest password accepted at registration
    pub min_password_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            login_path: "/login".to_string(),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

/// `<data dir>/taskdeck/jwt_token`, falling back to the working directory
pub fn default_token_file() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdeck")
        .join("jwt_token")
}

impl TaskdeckConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TaskdeckResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TaskdeckError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> TaskdeckResult<Self> {
        toml::from_str(content).map_err(|e| TaskdeckError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> TaskdeckResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TaskdeckError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| TaskdeckError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply `TASKDECK_API_BASE_URL` when it is set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(API_BASE_URL_ENV) {
            self.apply_base_url_override(Some(base_url));
        }
        self
    }

    fn apply_base_url_override(&mut self, base_url: Option<String>) {
        if let Some(base_url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = base_url;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> TaskdeckResult<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| TaskdeckError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://localhost:3000"),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TaskdeckError::Config {
                message: format!("Unsupported api.base_url scheme: {}", url.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use an http:// or https:// URL"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(TaskdeckError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        if self.session.min_password_length < MIN_PASSWORD_LENGTH {
            return Err(TaskdeckError::Config {
                message: format!(
                    "session.min_password_length must be at least {}",
                    MIN_PASSWORD_LENGTH
                ),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if !self.session.login_path.starts_with('/') {
            return Err(TaskdeckError::Config {
                message: format!(
                    "session.login_path must be an absolute path, got '{}'",
                    self.session.login_path
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use a path such as /login"),
            });
        }

        Ok(())
    }
}
