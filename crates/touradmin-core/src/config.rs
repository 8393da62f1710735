//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend base URL, login endpoint details, page size,
//! token storage backend, and last used username.
//!
//! Configuration is stored at `~/.config/touradmin/config.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "touradmin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "TOURADMIN_API_URL";

/// Environment variables used to prefill the login form
pub const USERNAME_ENV: &str = "TOURADMIN_USERNAME";
pub const PASSWORD_ENV: &str = "TOURADMIN_PASSWORD";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_LOGIN_PATH: &str = "/auth/login";
const DEFAULT_LOGIN_FIELD: &str = "email";
const DEFAULT_PAGE_SIZE: u32 = 10;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub login_path: String,
    /// JSON field the backend expects the username under
    pub login_field: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub token_storage: TokenStorage,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            login_field: DEFAULT_LOGIN_FIELD.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_storage: TokenStorage::File,
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            debug!(url = %url, "API base URL overridden from environment");
            config.api_base_url = url;
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Full URL of the login endpoint
    pub fn login_url(&self) -> String {
        let path = self.login_path.trim_start_matches('/');
        format!("{}/{}", self.base_url(), path)
    }

    /// Page size clamped to something the backend will accept
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, 100)
    }

    /// Build the token store selected by `token_storage`.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.token_storage, TokenStorage::File);
        assert!(config.last_username.is_none());
    }

    #[test]
    fn test_login_url_joins_cleanly() {
        let mut config = Config::default();
        config.api_base_url = "https://admin.example.com/api/".to_string();
        config.login_path = "/auth/login".to_string();
        assert_eq!(config.login_url(), "https://admin.example.com/api/auth/login");

        config.login_path = "users/signin".to_string();
        assert_eq!(config.login_url(), "https://admin.example.com/api/users/signin");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"page_size": 25, "token_storage": "keyring"}"#)
            .expect("partial config should parse");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.token_storage, TokenStorage::Keyring);
        assert_eq!(config.login_field, "email");
    }

    #[test]
    fn test_effective_page_size_clamped() {
        let mut config = Config::default();
        config.page_size = 0;
        assert_eq!(config.effective_page_size(), 1);
        config.page_size = 5000;
        assert_eq!(config.effective_page_size(), 100);
    }
}
