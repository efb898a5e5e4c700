//! Classification models and inference

pub mod labels;
pub mod manager;
pub mod postprocess;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use labels::LabelSet;
pub use manager::{ModelAssets, ModelManager};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use crate::error::VisionError;
use async_trait::async_trait;
use breedsight_core::ClassificationBatch;
use image::DynamicImage;

/// Runs one inference over an image.
///
/// Implementations return classifications ordered by descending confidence.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &DynamicImage) -> Result<ClassificationBatch, VisionError>;
}
