//! breedsight-eye: dog breed recognition on photos and camera streams
//!
//! Wraps an image classifier behind the [`models::Classifier`] trait, runs
//! its output through the top-k selector from `breedsight-core`, and hands
//! the rendered result to a [`display::PresentationSink`].

pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod gallery;
pub mod models;
pub mod preprocess;
pub mod session;

pub use camera::{DirectoryFrameSource, FrameSource, LatestFrame};
pub use config::{CropMode, Normalization, VisionConfig};
pub use display::{ChannelSink, DisplayUpdate, LogSink, PresentationSink};
pub use error::VisionError;
pub use models::Classifier;
pub use session::{PhotoSession, StreamSession};
