//! Configuration for the Weibo session and broadcast pacing
//!
//! Loads configuration from config.json, with environment overrides

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cookies::{parse_cookie_string, to_cookie_string, SessionCredential};
use crate::error::{Error, Result};

/// Default constants (fallback if config.json not found)
pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_SOURCE: &str = "209678993";
pub const DEFAULT_SEND_DELAY_SECS: i64 = 2;

/// Main configuration struct, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub source: String,
    /// Seconds to wait between two sends
    #[serde(default)]
    pub send_delay: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Create config with empty cookies and default pacing
    pub fn defaults() -> Self {
        Self {
            cookies: BTreeMap::new(),
            source: DEFAULT_SOURCE.to_string(),
            send_delay: DEFAULT_SEND_DELAY_SECS,
        }
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. Environment variables take precedence over file values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    /// Read `path` without consulting the environment.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::defaults());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.normalize();
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("WEIBO_COOKIE") {
            if !raw.trim().is_empty() {
                self.set_cookies_from_str(&raw);
            }
        }
        if let Ok(source) = std::env::var("WEIBO_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source.trim().to_string();
            }
        }
        if let Ok(delay) = std::env::var("WEIBO_SEND_DELAY") {
            if let Ok(parsed) = delay.trim().parse::<i64>() {
                self.send_delay = parsed;
            }
        }
    }

    /// Fill in defaults for missing or non-positive values
    fn normalize(&mut self) {
        if self.source.trim().is_empty() {
            self.source = DEFAULT_SOURCE.to_string();
        }
        if self.send_delay <= 0 {
            self.send_delay = DEFAULT_SEND_DELAY_SECS;
        }
    }

    /// Replace stored cookies with the ones parsed from a cookie string
    pub fn set_cookies_from_str(&mut self, raw: &str) {
        self.cookies = parse_cookie_string(raw);
    }

    /// Serialize stored cookies as a `Cookie` header value
    pub fn cookie_string(&self) -> String {
        to_cookie_string(&self.cookies)
    }

    pub fn is_logged_in(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Session credential built from stored cookies
    pub fn credential(&self) -> Result<SessionCredential> {
        if !self.is_logged_in() {
            return Err(Error::NotLoggedIn);
        }
        Ok(SessionCredential::from_cookies(&self.cookies))
    }

    /// Pause between two sends, never shorter than the default when unset
    pub fn send_delay(&self) -> Duration {
        let secs = if self.send_delay <= 0 {
            DEFAULT_SEND_DELAY_SECS
        } else {
            self.send_delay
        };
        Duration::from_secs(secs as u64)
    }
}
