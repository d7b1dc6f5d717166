//! Runtime configuration
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! environment variables. Command-line flags are applied last by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

/// Default reference dataset location
pub const DEFAULT_DATASET_PATH: &str = "Sleep_health_and_lifestyle_dataset.csv";

/// Default result ledger location
pub const DEFAULT_DATABASE_PATH: &str = "sleepdata.db";

pub const ENV_DATASET: &str = "SLEEPSCREEN_DATASET";
pub const ENV_DATABASE: &str = "SLEEPSCREEN_DB";
pub const ENV_MODEL: &str = "SLEEPSCREEN_MODEL";
pub const ENV_ENDPOINT: &str = "SLEEPSCREEN_ENDPOINT";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Settings for the chat-completions oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub temperature: f64,
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            temperature: 0.7,
            timeout_ms: 30_000,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub database_path: PathBuf,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Parse a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ScreenError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults, then `file` if given, then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self, ScreenError> {
        let mut config = match file {
            Some(path) => {
                if !path.exists() {
                    return Err(ScreenError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_json(&fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup(ENV_DATASET) {
            self.dataset_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_MODEL) {
            self.oracle.model = v;
        }
        if let Some(v) = lookup(ENV_ENDPOINT) {
            self.oracle.endpoint = v;
        }
        if let Some(v) = lookup(ENV_API_KEY) {
            self.oracle.api_key = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.database_path, PathBuf::from("sleepdata.db"));
        assert_eq!(config.oracle.model, "gpt-3.5-turbo");
        assert!(config.oracle.api_key.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            Config::from_json(r#"{"database_path": "/tmp/r.db", "oracle": {"model": "m"}}"#)
                .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.oracle.model, "m");
        assert_eq!(config.oracle.temperature, 0.7);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Config::from_json("{"), Err(ScreenError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATASET, "data/other.csv"),
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.dataset_path, PathBuf::from("data/other.csv"));
        assert_eq!(config.oracle.api_key, "sk-test");
        assert_eq!(config.oracle.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.oracle.api_key = "sk-secret".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/sleepscreen.json"))).unwrap_err();
        assert!(matches!(err, ScreenError::NotFound { .. }));
    }
}
