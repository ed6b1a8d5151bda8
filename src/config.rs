//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::stream::{ws_url_from_http, ReconnectPolicy, SessionOptions};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,

    /// WebSocket base; derived from `url` when unset
    #[serde(default)]
    pub ws_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    crate::api::DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            ws_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// WebSocket base URL for live streams
    pub fn ws_url(&self) -> String {
        match &self.ws_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => ws_url_from_http(&self.url),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Live stream reconnect and display settings
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    crate::stream::backoff::DEFAULT_MAX_ATTEMPTS
}

fn default_window_capacity() -> usize {
    crate::stream::DEFAULT_WINDOW_CAPACITY
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
            window_capacity: default_window_capacity(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl StreamConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_attempts: self.max_attempts,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            policy: self.policy(),
            window_capacity: self.window_capacity.max(1),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Where the login token is kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// Defaults to `<config dir>/optiya/credentials.json`
    #[serde(default)]
    pub token_file: Option<String>,
}

impl CredentialsConfig {
    pub fn token_path(&self) -> Option<PathBuf> {
        match &self.token_file {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|p| p.join("optiya").join("credentials.json")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit file if given, otherwise search the default locations
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_with_env(path),
            None => Ok(Self::load_default()),
        }
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in default_config_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = lookup("OPTIYA_API_URL") {
            self.api.url = url;
        }
        if let Some(url) = lookup("OPTIYA_WS_URL") {
            self.api.ws_url = Some(url);
        }

        // Stream overrides
        if let Some(attempts) = lookup("OPTIYA_STREAM_MAX_ATTEMPTS") {
            match attempts.parse() {
                Ok(n) => self.stream.max_attempts = n,
                Err(_) => tracing::warn!(value = %attempts, "Ignoring invalid OPTIYA_STREAM_MAX_ATTEMPTS"),
            }
        }

        // Credential overrides
        if let Some(path) = lookup("OPTIYA_TOKEN_FILE") {
            self.credentials.token_file = Some(path);
        }

        // Logging overrides
        if let Some(level) = lookup("OPTIYA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("OPTIYA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Config file search order
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("optiya").join("config.toml")),
        Some(PathBuf::from("/etc/optiya/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Optiya Console Configuration
#
# Environment variables override these settings:
# - OPTIYA_API_URL
# - OPTIYA_WS_URL
# - OPTIYA_STREAM_MAX_ATTEMPTS
# - OPTIYA_TOKEN_FILE
# - OPTIYA_LOG_LEVEL
# - OPTIYA_LOG_FORMAT

[api]
# Backend REST base URL
url = "http://localhost:8000"

# WebSocket base URL for live streams (derived from url when unset)
# ws_url = "ws://localhost:8000"

# Request timeout in seconds
request_timeout_secs = 30

[stream]
# First reconnect delay (ms); doubles on every attempt
base_delay_ms = 1000

# Reconnect delay cap (ms)
max_delay_ms = 60000

# Reconnect attempts before giving up
max_attempts = 10

# Recent detections kept on screen
window_capacity = 8

# WebSocket handshake timeout in seconds
connect_timeout_secs = 10

[credentials]
# Where the login token is stored
# token_file = "~/.config/optiya/credentials.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.url, "http://localhost:8000");
        assert_eq!(config.api.ws_url(), "ws://localhost:8000");
        assert_eq!(config.stream.policy(), ReconnectPolicy::default());
        assert_eq!(config.stream.session_options().window_capacity, 8);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.api.url, defaults.api.url);
        assert_eq!(config.api.ws_url, None);
        assert_eq!(config.stream.policy(), defaults.stream.policy());
        assert_eq!(config.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nurl = \"https://anpr.example.com\"\n\n[stream]\nmax_attempts = 3"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.ws_url(), "wss://anpr.example.com");
        assert_eq!(config.stream.max_attempts, 3);
        assert_eq!(config.stream.base_delay_ms, 1000);
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nmax_attempts = \"many\"").unwrap();
        let bad = Config::load(file.path());
        assert!(matches!(bad, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPTIYA_API_URL", "http://10.0.0.2:8000"),
            ("OPTIYA_WS_URL", "ws://10.0.0.3:9000/"),
            ("OPTIYA_STREAM_MAX_ATTEMPTS", "4"),
            ("OPTIYA_TOKEN_FILE", "/tmp/optiya-token.json"),
            ("OPTIYA_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.url, "http://10.0.0.2:8000");
        assert_eq!(config.api.ws_url(), "ws://10.0.0.3:9000");
        assert_eq!(config.stream.max_attempts, 4);
        assert_eq!(
            config.credentials.token_path(),
            Some(PathBuf::from("/tmp/optiya-token.json"))
        );
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_attempts_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "OPTIYA_STREAM_MAX_ATTEMPTS").then(|| "lots".to_string())
        });
        assert_eq!(config.stream.max_attempts, 10);
    }
}
