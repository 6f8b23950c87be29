//! Environment-backed settings.
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT`: HTTP bind address (default `127.0.0.1:8000`)
//! - `GOOGLE_API_KEY`: Gemini credential, required to start a run
//! - `GEMINI_API_URL`: Override the Gemini endpoint
//! - `HUDDLE_SETTLE_DELAY_MS`: Wait between specialist and primary startup
//! - `HUDDLE_DISCOVERY_ATTEMPTS` / `HUDDLE_DISCOVERY_INTERVAL_MS`: Discovery retry policy
//! - `HUDDLE_SCENARIO`: Cohort to start for each meeting (`travel`, `customer_service`, `assistant`)
//! - `KNOWLEDGE_FILE`: JSON chunk file for the assistant's knowledge index

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const GEMINI_API_URL_ENV: &str = "GEMINI_API_URL";
pub const SETTLE_DELAY_ENV: &str = "HUDDLE_SETTLE_DELAY_MS";
pub const DISCOVERY_ATTEMPTS_ENV: &str = "HUDDLE_DISCOVERY_ATTEMPTS";
pub const DISCOVERY_INTERVAL_ENV: &str = "HUDDLE_DISCOVERY_INTERVAL_MS";
pub const SCENARIO_ENV: &str = "HUDDLE_SCENARIO";
pub const KNOWLEDGE_FILE_ENV: &str = "KNOWLEDGE_FILE";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 3000;
const DEFAULT_DISCOVERY_ATTEMPTS: u32 = 3;
const DEFAULT_DISCOVERY_INTERVAL_MS: u64 = 2000;
const DEFAULT_SCENARIO: &str = "travel";

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Gemini API key.
    pub google_api_key: Option<String>,
    /// Gemini endpoint override.
    pub gemini_api_url: Option<String>,
    /// Fixed wait after launching specialists.
    pub settle_delay: Duration,
    /// Discovery polling rounds.
    pub discovery_attempts: u32,
    /// Spacing between discovery rounds.
    pub discovery_interval: Duration,
    /// Scenario name.
    pub scenario: String,
    /// Knowledge chunk file.
    pub knowledge_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            google_api_key: None,
            gemini_api_url: None,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            discovery_interval: Duration::from_millis(DEFAULT_DISCOVERY_INTERVAL_MS),
            scenario: DEFAULT_SCENARIO.to_string(),
            knowledge_file: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            host: get(HOST_ENV).unwrap_or(defaults.host),
            port: parse(PORT_ENV, get(PORT_ENV))?.unwrap_or(defaults.port),
            google_api_key: get(GOOGLE_API_KEY_ENV),
            gemini_api_url: get(GEMINI_API_URL_ENV),
            settle_delay: parse(SETTLE_DELAY_ENV, get(SETTLE_DELAY_ENV))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            discovery_attempts: parse(DISCOVERY_ATTEMPTS_ENV, get(DISCOVERY_ATTEMPTS_ENV))?
                .unwrap_or(defaults.discovery_attempts),
            discovery_interval: parse(DISCOVERY_INTERVAL_ENV, get(DISCOVERY_INTERVAL_ENV))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.discovery_interval),
            scenario: get(SCENARIO_ENV).unwrap_or(defaults.scenario),
            knowledge_file: get(KNOWLEDGE_FILE_ENV).map(PathBuf::from),
        })
    }

    /// Names of required credentials that are absent.
    pub fn missing_credentials(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.google_api_key.is_none() {
            missing.push(GOOGLE_API_KEY_ENV.to_string());
        }
        missing
    }

    /// Fails if any required credential is absent.
    pub fn require_credentials(&self) -> Result<()> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(missing))
        }
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Loads `.env.local`, falling back to `.env`, into the process environment.
///
/// Missing files are not an error. Returns the file that was loaded.
pub fn load_env_files() -> Option<PathBuf> {
    match dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv()) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded environment file");
            Some(path)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.bind_address(), "127.0.0.1:8000");
        assert_eq!(settings.settle_delay, Duration::from_secs(3));
        assert_eq!(settings.discovery_attempts, 3);
        assert_eq!(settings.discovery_interval, Duration::from_secs(2));
        assert_eq!(settings.scenario, "travel");
        assert!(settings.knowledge_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("HUDDLE_SETTLE_DELAY_MS", "250"),
            ("HUDDLE_SCENARIO", "customer_service"),
            ("KNOWLEDGE_FILE", "/tmp/chunks.json"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:9000");
        assert_eq!(settings.settle_delay, Duration::from_millis(250));
        assert_eq!(settings.scenario, "customer_service");
        assert_eq!(settings.knowledge_file, Some(PathBuf::from("/tmp/chunks.json")));
    }

    #[test]
    fn test_invalid_port() {
        let err = Settings::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn test_missing_credentials() {
        let settings = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")])).unwrap();
        assert_eq!(settings.missing_credentials(), vec!["GOOGLE_API_KEY".to_string()]);
        let err = settings.require_credentials().unwrap_err();
        assert_eq!(err.to_string(), "missing required environment variables: GOOGLE_API_KEY");

        let settings = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "k")])).unwrap();
        assert!(settings.require_credentials().is_ok());
    }
}
