//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, which credential backend holds the session token, and
//! the last username used to sign in.
//!
//! Configuration is stored at `~/.config/promptkeeper/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    DEFAULT_KEYRING_ACCOUNT,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "promptkeeper";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API base URL used when neither the config nor the environment sets one
pub const DEFAULT_API_URL: &str = "http://localhost:1337/api";

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "PROMPTKEEPER_API_URL";

/// Environment variable pre-filling the username prompt
pub const USERNAME_ENV: &str = "PROMPTKEEPER_USERNAME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    pub keyring_account: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config_dir>/promptkeeper/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base URL: environment first, then config, then the default
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Username to pre-fill: environment first, then the last one used
    pub fn default_username(&self) -> Option<String> {
        std::env::var(USERNAME_ENV)
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| self.last_username.clone())
    }

    /// Build the configured token store
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        let store: Arc<dyn CredentialStore> = match self.credential_backend {
            CredentialBackend::File => Arc::new(FileCredentialStore::new(self.data_dir()?)),
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new(
                self.keyring_account.as_deref().unwrap_or(DEFAULT_KEYRING_ACCOUNT),
            )),
            CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
        let previous = std::env::var(key).ok();
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
        EnvVarGuard { key, previous }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::File);
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("https://prompts.example.com/api".to_string()),
            credential_backend: CredentialBackend::Keyring,
            keyring_account: Some("work".to_string()),
            last_username: Some("alice".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url, config.api_url);
        assert_eq!(loaded.credential_backend, CredentialBackend::Keyring);
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_backend_names_are_lowercase() {
        let config: Config = serde_json::from_str(r#"{"credential_backend": "memory"}"#).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::Memory);
    }

    #[test]
    #[serial]
    fn test_api_url_precedence() {
        let _guard = set_env_var(API_URL_ENV, None);
        let mut config = Config::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);

        config.api_url = Some("https://from-config/api".to_string());
        assert_eq!(config.api_url(), "https://from-config/api");

        let _override = set_env_var(API_URL_ENV, Some("https://from-env/api"));
        assert_eq!(config.api_url(), "https://from-env/api");
    }

    #[test]
    #[serial]
    fn test_default_username_precedence() {
        let _guard = set_env_var(USERNAME_ENV, None);
        let config = Config {
            last_username: Some("alice".to_string()),
            ..Config::default()
        };
        assert_eq!(config.default_username().as_deref(), Some("alice"));

        let _override = set_env_var(USERNAME_ENV, Some("bob"));
        assert_eq!(config.default_username().as_deref(), Some("bob"));
    }

    #[test]
    fn test_memory_backend_starts_empty() {
        let config = Config {
            credential_backend: CredentialBackend::Memory,
            ..Config::default()
        };
        let store = config.credential_store().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
