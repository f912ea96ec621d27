//! The cookie file: an opaque name/value map copied verbatim into requests.

use crate::error::{ApotekError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Default location of the cookie file, relative to the working directory.
pub const DEFAULT_COOKIE_FILE: &str = "cookie.json";

/// Cookies as the user pasted them from the browser. Nothing here is
/// interpreted; an expired session only shows up as a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialBlob {
    cookies: BTreeMap<String, String>,
}

impl CredentialBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of string values, e.g. `{"session": "abc"}`.
    pub fn parse(text: &str) -> Result<Self> {
        let cookies: BTreeMap<String, String> = serde_json::from_str(text)
            .map_err(|e| ApotekError::Config(format!("cookie must be a JSON object of strings: {}", e)))?;
        Ok(Self { cookies })
    }

    /// Load the cookie file. A missing file is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ApotekError::Config(format!(
                "credential file not found: {} (create it with `apotek-tools auth cookie --set`)",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| ApotekError::io(path, e))?;
        Self::parse(&text).map_err(|e| match e {
            ApotekError::Config(msg) => ApotekError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Write the cookies as pretty JSON, replacing the file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.cookies)
            .map_err(|e| ApotekError::Config(format!("failed to serialize cookies: {}", e)))?;
        std::fs::write(path, text).map_err(|e| ApotekError::io(path, e))?;
        tracing::debug!(path = %path.display(), count = self.cookies.len(), "saved cookie file");
        Ok(())
    }

    /// Remove the cookie file. Returns whether there was one.
    pub fn delete(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ApotekError::io(path, e)),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Overlay cookies the server set on a response. Returns true when
    /// anything changed.
    pub fn merge(&mut self, refreshed: &CredentialBlob) -> bool {
        let mut changed = false;
        for (name, value) in &refreshed.cookies {
            if self.cookies.get(name) != Some(value) {
                self.cookies.insert(name.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    /// `name=value` pairs joined with `; ` in name order.
    pub fn to_cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.cookies).unwrap_or_else(|_| "{}".into())
    }
}
