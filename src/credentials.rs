//! Persisted access token and the credential context handed to the transport

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key the access token is stored under
pub const DEFAULT_TOKEN_KEY: &str = "access_token";

/// Credential context for outgoing requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    /// No token; requests go out unauthenticated
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// JSON credentials file holding the token under a fixed key
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    key: String,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials; a missing file or key means anonymous
    pub fn load(&self) -> Result<Credentials> {
        let entries = self.read_entries()?;

        let token = entries
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        debug!(
            "Loaded credentials from {} (authenticated: {})",
            self.path.display(),
            token.is_some()
        );

        Ok(Credentials { token })
    }

    /// Persist a token, keeping any other entries in the file
    pub fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(self.key.clone(), Value::String(token.to_string()));
        self.write_entries(&entries)?;
        info!("🔑 Access token saved to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored token
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(&self.key).is_some() {
            self.write_entries(&entries)?;
            info!("🔒 Access token removed from {}", self.path.display());
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Malformed credentials file {}", self.path.display()))
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
