// Effective CLI configuration: file, then environment overrides

use breedsight_core::config::{read_config, ConfigError};
use breedsight_core::SelectorConfig;
use breedsight_eye::VisionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub selector: SelectorConfig,
    pub vision: VisionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            selector: SelectorConfig::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if given, apply `BREEDSIGHT_*` overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_config(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("BREEDSIGHT_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(path) = lookup("BREEDSIGHT_MODEL_PATH") {
            self.vision.model_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("BREEDSIGHT_LABELS_PATH") {
            self.vision.labels_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("BREEDSIGHT_EXAMPLES_DIR") {
            self.vision.examples_dir = Some(PathBuf::from(dir));
        }

        if let Some(top_k) = lookup("BREEDSIGHT_TOP_K") {
            if let Ok(k) = top_k.parse::<usize>() {
                self.selector.top_k = k;
            }
        }

        if let Some(threshold) = lookup("BREEDSIGHT_CONFIDENCE_THRESHOLD") {
            if let Ok(t) = threshold.parse::<f32>() {
                self.selector.confidence_threshold = t;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector.validate()?;
        self.vision.validate().map_err(ConfigError::Validation)?;
        Ok(())
    }
}
