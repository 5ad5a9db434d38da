use anyhow::{anyhow, Context, Result};
use eduvid_core::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::credentials::DEFAULT_TOKEN_KEY;

/// Configuration for the educational video client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Backend endpoints
    pub api: ApiConfig,

    /// Where the access token lives
    pub auth: AuthConfig,

    /// Progress tracking settings
    pub sync: SyncConfig,

    /// Logging settings
    pub output: OutputConfig,

    /// Generation options sent with new uploads
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, e.g. http://localhost:8000
    pub base_url: String,

    /// Versioned REST prefix
    pub api_prefix: String,

    /// WebSocket origin for progress frames
    pub ws_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JSON file holding the persisted token
    pub credentials_file: PathBuf,

    /// Key the token is stored under
    pub token_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Task status poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Open the progress socket while watching a project
    pub enable_push: bool,

    /// Poll task status once a generation task id is known
    pub enable_poll: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,
}

impl ApiConfig {
    /// Versioned REST root, e.g. http://localhost:8000/api/v1
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_matches('/')
        )
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api/v1".to_string(),
            ws_base_url: "ws://localhost:8000".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from(".eduvid/credentials.json"),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            enable_push: true,
            enable_poll: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "eduvid.toml",
            "config/eduvid.toml",
            "/etc/eduvid/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load an explicit config file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env();
        Ok(config)
    }

    /// Defaults with environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `EDUVID_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("EDUVID_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(url) = std::env::var("EDUVID_WS_URL") {
            self.api.ws_base_url = url;
        }

        if let Ok(interval) = std::env::var("EDUVID_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(ms) => self.sync.poll_interval_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid EDUVID_POLL_INTERVAL_MS: {}", interval),
            }
        }

        if let Ok(path) = std::env::var("EDUVID_CREDENTIALS_FILE") {
            self.auth.credentials_file = PathBuf::from(path);
        }

        if let Ok(log_level) = std::env::var("EDUVID_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let api = Url::parse(&self.api.api_root())
            .map_err(|e| anyhow!("Invalid api.base_url {}: {}", self.api.base_url, e))?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(anyhow!("api.base_url must use http or https"));
        }

        let ws = Url::parse(&self.api.ws_base_url)
            .map_err(|e| anyhow!("Invalid api.ws_base_url {}: {}", self.api.ws_base_url, e))?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(anyhow!("api.ws_base_url must use ws or wss"));
        }

        if self.sync.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.auth.token_key.is_empty() {
            return Err(anyhow!("auth.token_key must not be empty"));
        }

        self.generation
            .validate()
            .map_err(|e| anyhow!("generation: {}", e))?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Eduvid Client Configuration:\n\
            - API: {}\n\
            - WebSocket: {}\n\
            - Credentials: {}\n\
            - Poll Interval: {}ms\n\
            - Push Channel: {}\n\
            - Polling: {}\n\
            - Default Quality: {}",
            self.api.api_root(),
            self.api.ws_base_url,
            self.auth.credentials_file.display(),
            self.sync.poll_interval_ms,
            self.sync.enable_push,
            self.sync.enable_poll,
            self.generation.quality.as_str()
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn with_ws_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.ws_base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.sync.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_credentials_file(mut self, path: PathBuf) -> Self {
        self.config.auth.credentials_file = path;
        self
    }

    pub fn enable_push(mut self, enable: bool) -> Self {
        self.config.sync.enable_push = enable;
        self
    }

    pub fn enable_poll(mut self, enable: bool) -> Self {
        self.config.sync.enable_poll = enable;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.api_root(), "http://localhost:8000/api/v1");
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(3));
        assert!(config.sync.enable_push);
        assert!(config.sync.enable_poll);
        assert_eq!(config.auth.token_key, "access_token");
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_base_url("https://videos.example.org/")
            .with_poll_interval(Duration::from_millis(500))
            .enable_push(false)
            .build();

        assert_eq!(config.api.api_root(), "https://videos.example.org/api/v1");
        assert_eq!(config.sync.poll_interval_ms, 500);
        assert!(!config.sync.enable_push);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let config = ConfigBuilder::new().with_ws_base_url("http://localhost:8000").build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_poll_interval(Duration::ZERO).build();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.style.music_volume = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eduvid.toml");
        std::fs::write(
            &path,
            r#"
            [sync]
            poll_interval_ms = 1000

            [generation]
            quality = "720p"
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sync.poll_interval_ms, 1000);
        assert!(config.sync.enable_poll);
        assert_eq!(config.generation.quality.as_str(), "720p");
        assert_eq!(config.api.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("eduvid.toml");

        let config = ConfigBuilder::new().enable_poll(false).build();
        config.save(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert!(!reloaded.sync.enable_poll);
        assert_eq!(reloaded.generation, config.generation);
    }
}
