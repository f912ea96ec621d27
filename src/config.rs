//! Contact details and API settings, stored as JSON next to the cookie file.
//!
//! Reads from `apotek_config.json` unless another path is given.

use crate::credentials::DEFAULT_COOKIE_FILE;
use crate::error::{ApotekError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "apotek_config.json";
pub const DEFAULT_BASE_URL: &str = "https://auliafarma.co.id/api/";

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "APOTEK_API_URL";

/// Contact block printed at the top of the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default = "default_whatsapp")]
    pub whatsapp: String,
    #[serde(default = "default_email")]
    pub email: String,
}

fn default_whatsapp() -> String {
    "+6281223556554".into()
}

fn default_email() -> String {
    "kontak@auliafarma.co.id".into()
}

impl Default for ContactRecord {
    fn default() -> Self {
        Self {
            whatsapp: default_whatsapp(),
            email: default_email(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_cookie_file")]
    pub cookie_file: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_cookie_file() -> String {
    DEFAULT_COOKIE_FILE.into()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cookie_file: default_cookie_file(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub contact: ContactRecord,
    #[serde(default)]
    pub api: ApiSettings,
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// Creates a default config file if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = AppConfig::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "created default config");
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ApotekError::io(path, e))?;
        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            ApotekError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Save configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ApotekError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents).map_err(|e| ApotekError::io(path, e))
    }

    /// Apply the given contact fields, leaving the others untouched, and save.
    pub fn update_contact(
        &mut self,
        whatsapp: Option<&str>,
        email: Option<&str>,
        path: &Path,
    ) -> Result<&ContactRecord> {
        if let Some(w) = whatsapp {
            self.contact.whatsapp = w.to_string();
        }
        if let Some(e) = email {
            self.contact.email = e.to_string();
        }
        self.save(path)?;
        Ok(&self.contact)
    }

    /// Base URL, honouring `APOTEK_API_URL`.
    pub fn effective_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api.base_url.clone())
    }

    /// Full URL of the drug list endpoint.
    pub fn drugs_url(&self) -> String {
        endpoint_url(&self.effective_base_url(), "drugs")
    }
}

/// Join a base URL and an endpoint name with exactly one slash.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

/// Expand a leading `~/` against the home directory.
pub fn resolve_path(raw: impl AsRef<Path>) -> PathBuf {
    let raw = raw.as_ref();
    match raw.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| raw.to_path_buf()),
        Err(_) => raw.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_contact_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut config = AppConfig::default();

        config
            .update_contact(Some("+628111"), Some("toko@example.com"), &path)
            .unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.contact, config.contact);
        assert_eq!(reloaded.contact.whatsapp, "+628111");
    }

    #[test]
    fn test_update_contact_keeps_unset_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut config = AppConfig::default();

        config.update_contact(None, Some("a@b.c"), &path).unwrap();
        assert_eq!(config.contact.whatsapp, default_whatsapp());
        assert_eq!(config.contact.email, "a@b.c");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"contact": {"email": "x@y.z"}}"#).unwrap();
        assert_eq!(config.contact.whatsapp, default_whatsapp());
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ApotekError::Config(_))));
    }

    #[test]
    fn test_endpoint_url_joins_once() {
        assert_eq!(endpoint_url("https://a.test/api/", "drugs"), "https://a.test/api/drugs");
        assert_eq!(endpoint_url("https://a.test/api", "drugs"), "https://a.test/api/drugs");
    }

    #[test]
    fn test_resolve_path_leaves_relative_paths() {
        assert_eq!(resolve_path("out/list.xlsx"), PathBuf::from("out/list.xlsx"));
    }
}
