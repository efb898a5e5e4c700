//! ONNX Runtime classifier for packaged breed models

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::manager::{ModelAssets, ModelManager};
use crate::models::postprocess::rank_scores;
use crate::models::{Classifier, LabelSet};
use crate::preprocess::prepare_input;
use async_trait::async_trait;
use breedsight_core::ClassificationBatch;
use image::DynamicImage;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Image classifier backed by an ONNX model with a single `[1, 3, H, W]`
/// input and a `[1, classes]` output.
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    labels: Arc<LabelSet>,
    config: Arc<VisionConfig>,
}

impl OnnxClassifier {
    /// Resolve and verify the configured model, then load it
    pub fn load(config: Arc<VisionConfig>) -> Result<Self, VisionError> {
        let assets = ModelManager::new(config.clone()).resolve()?;
        Self::from_assets(assets, config)
    }

    pub fn from_assets(assets: ModelAssets, config: Arc<VisionConfig>) -> Result<Self, VisionError> {
        let session = Session::builder()
            .map_err(|e| VisionError::Ort(format!("Failed to create session builder: {}", e)))?
            .commit_from_file(&assets.model_path)
            .map_err(|e| VisionError::Ort(format!("Failed to load model: {}", e)))?;

        info!(
            "Classification model loaded from {:?} ({} classes)",
            assets.model_path,
            assets.labels.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            labels: Arc::new(assets.labels),
            config,
        })
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn classify(&self, image: &DynamicImage) -> Result<ClassificationBatch, VisionError> {
        let input = prepare_input(image, &self.config)?;
        let (width, height) = self.config.input_size;
        let session = self.session.clone();

        // Inference blocks; keep it off the async workers
        let scores = tokio::task::spawn_blocking(move || run_session(&session, input, width, height))
            .await
            .map_err(|e| VisionError::Processing(format!("Inference task failed: {}", e)))??;

        debug!("Model produced {} scores", scores.len());
        rank_scores(&scores, &self.labels, self.config.apply_softmax)
    }
}

fn run_session(
    session: &Mutex<Session>,
    input: Vec<f32>,
    width: u32,
    height: u32,
) -> Result<Vec<f32>, VisionError> {
    let shape = [1usize, 3, height as usize, width as usize];
    let tensor = Tensor::from_array((shape, input))
        .map_err(|e| VisionError::Ort(format!("Failed to create input tensor: {}", e)))?;

    let mut session = session.lock();
    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| VisionError::Ort(format!("Inference failed: {}", e)))?;

    if outputs.len() == 0 {
        return Err(VisionError::Ort("Model produced no outputs".to_string()));
    }

    let (_, scores) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::Ort(format!("Failed to extract output tensor: {}", e)))?;

    Ok(scores.to_vec())
}
