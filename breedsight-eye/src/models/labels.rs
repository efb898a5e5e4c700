//! Class label tables

use crate::error::VisionError;
use std::path::Path;

/// Class labels in model output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Result<Self, VisionError> {
        if labels.is_empty() {
            return Err(VisionError::Model("Label set is empty".to_string()));
        }
        Ok(Self { labels })
    }

    /// Parse one label per line. Blank lines and surrounding whitespace are ignored.
    pub fn parse(content: &str) -> Result<Self, VisionError> {
        let labels = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(labels)
    }

    pub fn from_file(path: &Path) -> Result<Self, VisionError> {
        let content = std::fs::read_to_string(path)?;
        let labels = Self::parse(&content)?;
        tracing::info!("Loaded {} labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blank_lines() {
        let labels = LabelSet::parse("beagle\n\n  pug \nboxer\n").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(1), Some("pug"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn test_parse_empty() {
        assert!(LabelSet::parse("\n \n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "beagle").unwrap();
        writeln!(file, "husky").unwrap();
        let labels = LabelSet::from_file(file.path()).unwrap();
        assert_eq!(labels.as_slice(), &["beagle".to_string(), "husky".to_string()]);
    }

    #[test]
    fn test_from_missing_file() {
        let result = LabelSet::from_file(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(VisionError::Io(_))));
    }
}
