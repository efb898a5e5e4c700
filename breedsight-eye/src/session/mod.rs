//! Recognition sessions: one-shot photo mode and continuous stream mode

pub mod photo;
pub mod stream;

pub use photo::{PhotoSession, RecognitionOutcome};
pub use stream::{CycleOutcome, StreamSession, StreamStats};

use crate::config::VisionConfig;
use crate::display::{DisplayUpdate, PresentationSink};
use crate::error::VisionError;
use crate::models::Classifier;
use breedsight_core::{SelectionResult, SelectorConfig, TopKSelector};
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

/// Classifier, selector and sink shared by both session kinds.
pub struct RecognitionPipeline {
    classifier: Arc<dyn Classifier>,
    selector: TopKSelector,
    selector_config: SelectorConfig,
    sink: Arc<dyn PresentationSink>,
}

impl RecognitionPipeline {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        selector_config: SelectorConfig,
        sink: Arc<dyn PresentationSink>,
    ) -> Result<Self, VisionError> {
        selector_config
            .validate()
            .map_err(|e| VisionError::Config(e.to_string()))?;

        Ok(Self {
            classifier,
            selector: TopKSelector::from_config(&selector_config),
            selector_config,
            sink,
        })
    }

    /// Classify `image` and select the top entries
    pub async fn recognize(&self, image: &DynamicImage) -> Result<SelectionResult, VisionError> {
        let batch = self.classifier.classify(image).await?;
        debug!("Inference returned {} classifications", batch.len());
        Ok(self.selector.select(&batch)?)
    }

    pub fn selector_config(&self) -> &SelectorConfig {
        &self.selector_config
    }

    pub fn present(&self, update: DisplayUpdate) {
        self.sink.present(update);
    }
}

fn validate_vision_config(config: &VisionConfig) -> Result<(), VisionError> {
    config.validate().map_err(VisionError::Config)
}
