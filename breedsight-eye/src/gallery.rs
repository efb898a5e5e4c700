//! Example pictures keyed by breed label

use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Looks up `<label>.<ext>` in a directory of example pictures
#[derive(Debug, Clone)]
pub struct ExampleGallery {
    dir: PathBuf,
}

impl ExampleGallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the example picture for `label`, if one exists.
    ///
    /// Labels that could escape the gallery directory never match.
    pub fn lookup(&self, label: &str) -> Option<PathBuf> {
        if label.is_empty()
            || label.contains("..")
            || label.contains('/')
            || label.contains('\\')
        {
            return None;
        }

        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", label, ext)))
            .find(|candidate| candidate.is_file())
    }
}
