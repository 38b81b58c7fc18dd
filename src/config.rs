//! Client configuration.
//!
//! Loaded from `skybook.toml` (or an explicit path), then overridden by
//! `SKYBOOK_API_URL` / `SKYBOOK_SESSION_FILE`, then by command-line flags.
//! Missing values fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BookingError;

pub const DEFAULT_CONFIG_FILE: &str = "skybook.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the REST paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// HTTP or SOCKS5 proxy
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the logged-in session is persisted between runs
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    10
}

fn default_session_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".skybook").join("session.json"),
        None => PathBuf::from(".skybook-session.json"),
    }
}

impl Config {
    /// Reads `path` if given (it must exist), else `skybook.toml` in the
    /// working directory if present, else defaults. Env overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self, BookingError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, BookingError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, BookingError> {
        toml::from_str(raw).map_err(|e| BookingError::Config(e.to_string()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SKYBOOK_API_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(file) = lookup("SKYBOOK_SESSION_FILE").filter(|v| !v.is_empty()) {
            self.session.path = PathBuf::from(file);
        }
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(BookingError::Config(format!(
                "api.base_url must start with http:// or https://, got \"{url}\""
            )));
        }
        if self.api.timeout == 0 {
            return Err(BookingError::Config("api.timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout, 30);
        assert_eq!(config.poll.interval(), Duration::from_secs(10));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://book.example.com/api"

            [poll]
            interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://book.example.com/api");
        assert_eq!(config.api.timeout, 30);
        assert_eq!(config.poll.interval_secs, 5);
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "SKYBOOK_API_URL" => Some("https://staging.example.com".into()),
            "SKYBOOK_SESSION_FILE" => Some("/tmp/s.json".into()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://staging.example.com");
        assert_eq!(config.session.path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = Config::default();
        config.api.base_url = "ftp://nope".into();
        assert!(matches!(config.validate(), Err(BookingError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(Config::parse("[api"), Err(BookingError::Config(_))));
    }
}
