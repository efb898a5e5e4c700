//! Presentation of recognition results

use breedsight_core::{SelectionResult, SelectorConfig};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const STATUS_DETECTING: &str = "detecting scene...";
pub const STATUS_INCORRECT_FORMAT: &str = "<Incorrect photo format>";

/// One update for the interactive surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayUpdate {
    /// Debug panel text; `None` leaves the panel unchanged
    pub debug_text: Option<String>,
    /// Main result label
    pub result_text: String,
    /// Example picture for the winning label (photo mode only).
    ///
    /// Unlike `debug_text` this is always stated in full: `None` clears any
    /// picture shown by an earlier update.
    pub example_image: Option<PathBuf>,
}

impl DisplayUpdate {
    /// Render a successful selection: the top-k listing plus winner or fallback
    pub fn from_selection(result: &SelectionResult, config: &SelectorConfig) -> Self {
        Self {
            debug_text: Some(format!(
                "TOP {} PROBABILITIES: \n{}",
                config.top_k, result.top_summary
            )),
            result_text: result.display_label(&config.fallback_label).to_string(),
            example_image: None,
        }
    }

    /// Inference returned nothing: fallback label and an empty debug panel
    pub fn no_results(config: &SelectorConfig) -> Self {
        Self {
            debug_text: Some(String::new()),
            result_text: config.fallback_label.clone(),
            example_image: None,
        }
    }

    /// Transient status shown while work is in progress
    pub fn status(text: impl Into<String>) -> Self {
        Self {
            debug_text: None,
            result_text: text.into(),
            example_image: None,
        }
    }

    /// The picked photo could not be decoded
    pub fn incorrect_format() -> Self {
        Self {
            debug_text: Some(String::new()),
            result_text: STATUS_INCORRECT_FORMAT.to_string(),
            example_image: None,
        }
    }

    pub fn with_example_image(mut self, path: Option<PathBuf>) -> Self {
        self.example_image = path;
        self
    }
}

/// Receives display updates.
///
/// Implementations are responsible for getting the update onto whichever
/// thread owns the display. A `None` debug text keeps the current panel,
/// while a `None` example image removes the current picture.
pub trait PresentationSink: Send + Sync {
    fn present(&self, update: DisplayUpdate);
}

/// Forwards updates to the task that owns the display.
#[derive(Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<DisplayUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl PresentationSink for ChannelSink {
    fn present(&self, update: DisplayUpdate) {
        if self.sender.send(update).is_err() {
            debug!("Display receiver dropped, discarding update");
        }
    }
}

/// Writes updates to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn present(&self, update: DisplayUpdate) {
        match &update.debug_text {
            Some(debug_text) if !debug_text.is_empty() => {
                info!(result = %update.result_text, "{}", debug_text)
            }
            _ => info!(result = %update.result_text, "display updated"),
        }
    }
}
