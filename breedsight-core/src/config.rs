// Configuration primitives shared by every breedsight crate

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_FALLBACK_LABEL: &str = "Unknown";

/// Top-k selector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Number of entries listed in the summary
    pub top_k: usize,
    /// The top confidence must be strictly greater than this to win
    pub confidence_threshold: f32,
    /// Shown instead of a winning label when there is none
    pub fallback_label: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fallback_label: DEFAULT_FALLBACK_LABEL.to_string(),
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Validation("selector.top_k must be > 0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Validation(
                "selector.confidence_threshold must be within [0, 1]".to_string(),
            ));
        }

        if self.fallback_label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "selector.fallback_label cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Configuration(err.to_string())
    }
}

/// Parse configuration text. JSON is tried first, then TOML, then YAML.
pub fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    if let Ok(config) = serde_json::from_str::<T>(content) {
        return Ok(config);
    }

    if let Ok(config) = toml::from_str::<T>(content) {
        return Ok(config);
    }

    match serde_yaml::from_str::<T>(content) {
        Ok(config) => Ok(config),
        Err(e) => Err(ConfigError::Parse(format!(
            "not valid JSON, TOML or YAML ({})",
            e
        ))),
    }
}

/// Read and parse a configuration file
pub fn read_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    tracing::debug!("Loaded configuration from {:?}", path);
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_selector_config_default() {
        let config = SelectorConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.confidence_threshold, 0.01);
        assert_eq!(config.fallback_label, "Unknown");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_selector_config_validation() {
        let mut config = SelectorConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = SelectorConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        config.confidence_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SelectorConfig::default();
        config.fallback_label = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_json_toml_yaml() {
        let json: SelectorConfig = parse_config(r#"{"top_k": 5}"#).unwrap();
        assert_eq!(json.top_k, 5);
        assert_eq!(json.fallback_label, "Unknown");

        let toml: SelectorConfig = parse_config("confidence_threshold = 0.2\n").unwrap();
        assert_eq!(toml.confidence_threshold, 0.2);
        assert_eq!(toml.top_k, 3);

        let yaml: SelectorConfig = parse_config("fallback_label: \"No dog\"\ntop_k: 1\n").unwrap();
        assert_eq!(yaml.fallback_label, "No dog");
        assert_eq!(yaml.top_k, 1);
    }

    #[test]
    fn test_parse_garbage() {
        let result = parse_config::<SelectorConfig>("top_k: [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_read_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_k = 2").unwrap();
        let config: SelectorConfig = read_config(file.path()).unwrap();
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn test_read_config_missing_file() {
        let result = read_config::<SelectorConfig>("/nonexistent/breedsight.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
