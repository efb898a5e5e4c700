//! Frame sources feeding the stream session

use crate::error::VisionError;
use async_trait::async_trait;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Anything that can hand out the camera's current frame.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// The most recent frame, or `None` when no frame is available yet.
    async fn current_frame(&self) -> Result<Option<Arc<DynamicImage>>, VisionError>;
}

/// Publishing half of [`LatestFrame`]
#[derive(Clone)]
pub struct FramePublisher {
    sender: Arc<watch::Sender<Option<Arc<DynamicImage>>>>,
}

impl FramePublisher {
    /// Replace the current frame. Older frames that were never read are dropped.
    pub fn publish(&self, frame: DynamicImage) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    pub fn clear(&self) {
        self.sender.send_replace(None);
    }
}

/// Frame source that always yields the newest published frame
#[derive(Clone)]
pub struct LatestFrame {
    receiver: watch::Receiver<Option<Arc<DynamicImage>>>,
}

impl LatestFrame {
    pub fn channel() -> (FramePublisher, LatestFrame) {
        let (sender, receiver) = watch::channel(None);
        (
            FramePublisher {
                sender: Arc::new(sender),
            },
            LatestFrame { receiver },
        )
    }
}

#[async_trait]
impl FrameSource for LatestFrame {
    async fn current_frame(&self) -> Result<Option<Arc<DynamicImage>>, VisionError> {
        let frame = self.receiver.borrow().clone();
        Ok(frame)
    }
}

/// Replays the images in a directory as camera frames, in file name order
pub struct DirectoryFrameSource {
    frames: Vec<PathBuf>,
    next: AtomicUsize,
    looping: bool,
}

impl DirectoryFrameSource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self, VisionError> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| VisionError::Camera(format!("Cannot read frame directory {:?}: {}", dir, e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image_path(path))
            .collect();

        if frames.is_empty() {
            return Err(VisionError::Camera(format!("No image frames found in {:?}", dir)));
        }

        frames.sort();
        info!("Frame source opened with {} frames from {:?}", frames.len(), dir);

        Ok(Self {
            frames,
            next: AtomicUsize::new(0),
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn next_path(&self) -> Option<PathBuf> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        if self.looping {
            Some(self.frames[index % self.frames.len()].clone())
        } else {
            self.frames.get(index).cloned()
        }
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn current_frame(&self) -> Result<Option<Arc<DynamicImage>>, VisionError> {
        let Some(path) = self.next_path() else {
            return Ok(None);
        };

        debug!("Reading frame {:?}", path);
        let image = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| VisionError::Camera(format!("Frame read task failed: {}", e)))??;

        Ok(Some(Arc::new(image)))
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
