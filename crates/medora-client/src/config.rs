//! # Portal Configuration
//!
//! Configuration management for the portal client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDORA_API_URL=https://api.medora.example/api                      │
//! │     MEDORA_DATA_DIR=/var/lib/medora                                    │
//! │     MEDORA_DEFAULT_LANG=ar                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/medora-portal/portal.toml (Linux)                        │
//! │     ~/Library/Application Support/com.medora.portal/portal.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:3001/api, platform data dir, English              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # portal.toml
//! [api]
//! base_url = "https://api.medora.example/api"
//!
//! [session]
//! data_dir = "/var/lib/medora"   # where session.json is kept
//!
//! [ui]
//! default_language = "en"        # en | ar
//! ```

use medora_core::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

// =============================================================================
// Sections
// =============================================================================

/// Where the REST API lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_url")]
    pub base_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_api_url(),
        }
    }
}

/// Where the session is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Overrides the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Interface defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Language used when the user has none (e.g. the login screen after
    /// logout).
    #[serde(default)]
    pub default_language: Language,
}

// =============================================================================
// Portal Config
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

impl PortalConfig {
    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading portal config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load portal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Config(format!("{}: {}", parent.display(), e)))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;

        info!(?path, "Portal config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API URL cannot be used as a base: {}",
                self.api.base_url
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MEDORA_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(dir) = std::env::var("MEDORA_DATA_DIR") {
            debug!(dir = %dir, "Overriding data directory from environment");
            self.session.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(lang) = std::env::var("MEDORA_DEFAULT_LANG") {
            match lang.parse() {
                Ok(parsed) => self.ui.default_language = parsed,
                Err(e) => warn!(lang = %lang, "Ignoring MEDORA_DEFAULT_LANG: {}", e),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "medora", "portal")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("portal.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed API base URL, normalised to end with `/` so endpoint paths
    /// join under it instead of replacing its last segment.
    pub fn api_url(&self) -> ClientResult<Url> {
        let mut url = Url::parse(&self.api.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Directory holding `session.json`.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.session
            .data_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }

    /// Full path of the persisted session file.
    pub fn session_file(&self) -> Option<PathBuf> {
        self.data_dir().map(|dir| dir.join(SESSION_FILE_NAME))
    }

    pub fn default_language(&self) -> Language {
        self.ui.default_language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.default_language(), Language::En);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = PortalConfig::default();

        config.api.base_url = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://api.example.com/v1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let mut config = PortalConfig::default();
        config.api.base_url = "https://api.example.com/api".to_string();

        let url = config.api_url().unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/");
        assert_eq!(
            url.join("auth/login").unwrap().as_str(),
            "https://api.example.com/api/auth/login"
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PortalConfig::default();
        config.ui.default_language = Language::Ar;
        config.session.data_dir = Some(PathBuf::from("/tmp/medora"));

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("default_language = \"ar\""));

        let parsed: PortalConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: PortalConfig = toml::from_str("[ui]\ndefault_language = \"ar\"\n").unwrap();
        assert_eq!(parsed.api.base_url, DEFAULT_API_URL);
        assert_eq!(parsed.default_language(), Language::Ar);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://portal.example.com/api\"\n").unwrap();

        let config = PortalConfig::load(Some(path)).unwrap();
        // MEDORA_API_URL may be set in the environment running the tests.
        if std::env::var("MEDORA_API_URL").is_err() {
            assert_eq!(config.api.base_url, "https://portal.example.com/api");
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("portal.toml");

        let config = PortalConfig::default();
        config.save(Some(path.clone())).unwrap();
        assert!(path.exists());

        let loaded = PortalConfig::load_or_default(Some(path));
        assert!(loaded.validate().is_ok());
    }
}
