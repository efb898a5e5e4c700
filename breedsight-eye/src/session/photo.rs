//! Photo mode: one recognition per picked image

use super::{validate_vision_config, RecognitionPipeline};
use crate::config::VisionConfig;
use crate::display::{DisplayUpdate, PresentationSink, STATUS_DETECTING};
use crate::error::VisionError;
use crate::gallery::ExampleGallery;
use crate::models::Classifier;
use breedsight_core::{SelectionResult, SelectorConfig};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What a photo recognition ended up showing
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionOutcome {
    /// `None` when the classifier returned no results
    pub selection: Option<SelectionResult>,
    /// Winner, or the fallback label
    pub result_text: String,
    pub example_image: Option<PathBuf>,
    pub completed_at: DateTime<Utc>,
}

/// Recognizes still photos, one inference per user action
#[derive(Clone)]
pub struct PhotoSession {
    pipeline: Arc<RecognitionPipeline>,
    gallery: Option<ExampleGallery>,
    /// Completion signal of the most recently submitted photo
    last_submitted: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
}

impl PhotoSession {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        selector_config: SelectorConfig,
        sink: Arc<dyn PresentationSink>,
        vision_config: &VisionConfig,
    ) -> Result<Self, VisionError> {
        validate_vision_config(vision_config)?;
        let pipeline = RecognitionPipeline::new(classifier, selector_config, sink)?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            gallery: vision_config.examples_dir.clone().map(ExampleGallery::new),
            last_submitted: Arc::new(Mutex::new(None)),
        })
    }

    /// Decode encoded image bytes and recognize them.
    ///
    /// Undecodable input is reported on the display as an incorrect format.
    pub async fn recognize_bytes(&self, bytes: &[u8]) -> Result<RecognitionOutcome, VisionError> {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!("Cannot decode picked photo: {}", e);
                self.pipeline
                    .present(DisplayUpdate::incorrect_format().with_example_image(None));
                return Err(e.into());
            }
        };
        self.recognize_image(&image).await
    }

    pub async fn recognize_path(&self, path: &Path) -> Result<RecognitionOutcome, VisionError> {
        let bytes = tokio::fs::read(path).await?;
        self.recognize_bytes(&bytes).await
    }

    /// Recognize a decoded image and present the result.
    ///
    /// Inference failures are logged and leave the display showing the
    /// in-progress status.
    pub async fn recognize_image(&self, image: &DynamicImage) -> Result<RecognitionOutcome, VisionError> {
        self.pipeline.present(DisplayUpdate::status(STATUS_DETECTING));

        let config = self.pipeline.selector_config();
        match self.pipeline.recognize(image).await {
            Ok(selection) => {
                let example_image = selection
                    .winning_label
                    .as_deref()
                    .and_then(|label| self.gallery.as_ref()?.lookup(label));
                let update = DisplayUpdate::from_selection(&selection, config)
                    .with_example_image(example_image.clone());
                let result_text = update.result_text.clone();
                self.pipeline.present(update);
                info!("Photo recognized as {}", result_text);

                Ok(RecognitionOutcome {
                    selection: Some(selection),
                    result_text,
                    example_image,
                    completed_at: Utc::now(),
                })
            }
            Err(e) if e.is_no_results() => {
                warn!("No results for photo");
                self.pipeline.present(DisplayUpdate::no_results(config));

                Ok(RecognitionOutcome {
                    selection: None,
                    result_text: config.fallback_label.clone(),
                    example_image: None,
                    completed_at: Utc::now(),
                })
            }
            Err(e) => {
                error!("Photo recognition failed: {}", e);
                Err(e)
            }
        }
    }

    /// Dispatch recognition of `bytes` onto a worker task.
    ///
    /// Submissions run one at a time in submission order, so the display
    /// always ends on the most recently submitted photo.
    pub fn submit(&self, bytes: Vec<u8>) -> JoinHandle<Result<RecognitionOutcome, VisionError>> {
        let (done, done_signal) = oneshot::channel();
        let previous = self.last_submitted.lock().replace(done_signal);
        let session = self.clone();

        tokio::spawn(async move {
            if let Some(previous) = previous {
                // A dropped sender means the earlier task ended abnormally
                let _ = previous.await;
            }
            let outcome = session.recognize_bytes(&bytes).await;
            let _ = done.send(());
            outcome
        })
    }
}
