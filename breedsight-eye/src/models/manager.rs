//! Model asset resolution and integrity checks

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::LabelSet;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything needed to construct a classifier
#[derive(Debug, Clone)]
pub struct ModelAssets {
    pub model_path: PathBuf,
    pub labels: LabelSet,
}

/// Locates the packaged model and its labels and verifies them
pub struct ModelManager {
    config: Arc<VisionConfig>,
}

impl ModelManager {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self { config }
    }

    /// Check the model file exists and matches the configured checksum
    pub fn verify_model(&self) -> Result<PathBuf, VisionError> {
        let model_path = &self.config.model_path;
        if !model_path.is_file() {
            return Err(VisionError::Model(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        match &self.config.model_sha256 {
            Some(expected) => {
                let computed = sha256_file(model_path)?;
                if !computed.eq_ignore_ascii_case(expected) {
                    return Err(VisionError::Model(format!(
                        "Checksum mismatch for model {:?}: expected {}, got {}",
                        model_path, expected, computed
                    )));
                }
                info!("Verified checksum for model {:?}", model_path);
            }
            None => {
                warn!("No checksum configured for {:?}, skipping verification", model_path);
            }
        }

        Ok(model_path.clone())
    }

    pub fn load_labels(&self) -> Result<LabelSet, VisionError> {
        LabelSet::from_file(&self.config.labels_path)
    }

    /// Verify the model and load its labels
    pub fn resolve(&self) -> Result<ModelAssets, VisionError> {
        let model_path = self.verify_model()?;
        let labels = self.load_labels()?;
        Ok(ModelAssets { model_path, labels })
    }
}

/// Hex-encoded SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String, VisionError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn checksum_of(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    fn setup(model: &[u8], labels: &str) -> (TempDir, VisionConfig) {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("dogs.onnx");
        let labels_path = temp_dir.path().join("dogs.txt");
        std::fs::write(&model_path, model).unwrap();
        std::fs::write(&labels_path, labels).unwrap();

        let config = VisionConfig {
            model_path,
            labels_path,
            ..VisionConfig::default()
        };
        (temp_dir, config)
    }

    #[test]
    fn test_verify_missing_model() {
        let mut config = VisionConfig::default();
        config.model_path = PathBuf::from("/nonexistent/dogs.onnx");
        let manager = ModelManager::new(Arc::new(config));
        assert!(matches!(manager.verify_model(), Err(VisionError::Model(_))));
    }

    #[test]
    fn test_verify_without_checksum() {
        let (_dir, config) = setup(b"model-bytes", "beagle\n");
        let manager = ModelManager::new(Arc::new(config.clone()));
        assert_eq!(manager.verify_model().unwrap(), config.model_path);
    }

    #[test]
    fn test_verify_checksum_match_is_case_insensitive() {
        let (_dir, mut config) = setup(b"model-bytes", "beagle\n");
        config.model_sha256 = Some(checksum_of(b"model-bytes").to_uppercase());
        let manager = ModelManager::new(Arc::new(config));
        assert!(manager.verify_model().is_ok());
    }

    #[test]
    fn test_verify_checksum_mismatch() {
        let (_dir, mut config) = setup(b"model-bytes", "beagle\n");
        config.model_sha256 = Some(checksum_of(b"other-bytes"));
        let manager = ModelManager::new(Arc::new(config));
        let err = manager.verify_model().unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_resolve_loads_labels() {
        let (_dir, config) = setup(b"model-bytes", "beagle\npug\n");
        let manager = ModelManager::new(Arc::new(config));
        let assets = manager.resolve().unwrap();
        assert_eq!(assets.labels.len(), 2);
    }

    #[test]
    fn test_sha256_file_known_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
