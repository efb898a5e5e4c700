//! Configuration for breedsight-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a frame is fitted to the model's square input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropMode {
    /// Crop the largest centred square, then scale
    CenterCrop,
    /// Scale to fit inside the input, padding the rest with black
    ScaleFit,
    /// Stretch to the input size, ignoring aspect ratio
    ScaleFill,
}

/// Pixel normalisation applied after scaling to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    /// Leave values in [0, 1]
    Unit,
    /// Subtract ImageNet mean and divide by std per channel
    ImageNet,
}

/// Vision system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Path to the packaged classification model
    pub model_path: PathBuf,
    /// Text file with one class label per line, in model output order
    pub labels_path: PathBuf,
    /// Expected SHA-256 of the model file (hex), verified when set
    pub model_sha256: Option<String>,
    /// Model input resolution (width, height)
    pub input_size: (u32, u32),
    pub crop_mode: CropMode,
    pub normalization: Normalization,
    /// Model emits logits rather than probabilities
    pub apply_softmax: bool,
    /// Pause between stream iterations when no camera frame is available
    pub idle_interval_ms: u64,
    /// Directory holding `<label>.png|jpg` example pictures for photo mode
    pub examples_dir: Option<PathBuf>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_dir = dirs::home_dir()
            .map(|mut p| {
                p.push(".breedsight");
                p.push("models");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models"));

        Self {
            model_path: model_dir.join("dog_breeds.onnx"),
            labels_path: model_dir.join("dog_breeds.txt"),
            model_sha256: None,
            input_size: (224, 224),
            crop_mode: CropMode::CenterCrop,
            normalization: Normalization::ImageNet,
            apply_softmax: true,
            idle_interval_ms: 33,
            examples_dir: None,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err("Input size must be non-zero".to_string());
        }

        if self.input_size.0 > 4096 || self.input_size.1 > 4096 {
            return Err("Input size too large (max 4096)".to_string());
        }

        if self.idle_interval_ms == 0 || self.idle_interval_ms > 10_000 {
            return Err("Idle interval must be between 1 and 10000 ms".to_string());
        }

        if let Some(checksum) = &self.model_sha256 {
            if checksum.len() != 64 || !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("model_sha256 must be 64 hex characters".to_string());
            }
        }

        if self.model_path.as_os_str().is_empty() {
            return Err("Model path cannot be empty".to_string());
        }

        Ok(())
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.input_size, (224, 224));
        assert_eq!(config.crop_mode, CropMode::CenterCrop);
        assert_eq!(config.normalization, Normalization::ImageNet);
        assert!(config.apply_softmax);
        assert!(config.model_sha256.is_none());
        assert!(config.model_path.ends_with("dog_breeds.onnx"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_input_size() {
        let mut config = VisionConfig::default();
        config.input_size = (0, 224);
        assert!(config.validate().is_err());

        config.input_size = (224, 4097);
        assert!(config.validate().is_err());

        config.input_size = (1, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_idle_interval() {
        let mut config = VisionConfig::default();
        config.idle_interval_ms = 0;
        assert!(config.validate().is_err());

        config.idle_interval_ms = 10_001;
        assert!(config.validate().is_err());

        config.idle_interval_ms = 10_000;
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_validation_checksum() {
        let mut config = VisionConfig::default();
        config.model_sha256 = Some("abc".to_string());
        assert!(config.validate().is_err());

        config.model_sha256 = Some("z".repeat(64));
        assert!(config.validate().is_err());

        config.model_sha256 = Some("a".repeat(64));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_model_path() {
        let mut config = VisionConfig::default();
        config.model_path = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
