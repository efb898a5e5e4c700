use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single (label, confidence) pair produced by an image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Reject confidences outside [0, 1] and labels spanning several lines.
    /// NaN is rejected as well.
    pub fn validate(&self) -> Result<()> {
        if self.label.contains(['\n', '\r']) {
            return Err(Error::InvalidInput(format!(
                "label {:?} contains a line break",
                self.label
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidInput(format!(
                "confidence {} for label '{}' is outside [0, 1]",
                self.confidence, self.label
            )));
        }
        Ok(())
    }
}

/// Results of one inference call, ordered by descending confidence.
///
/// The ordering is established by whoever builds the batch (normally the
/// inference adapter); consumers rely on it and never re-sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationBatch {
    entries: Vec<Classification>,
}

impl ClassificationBatch {
    /// Wrap entries that are already in descending-confidence order.
    pub fn new(entries: Vec<Classification>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Pair raw model scores with their labels and order them by descending
    /// confidence. Ties keep label order.
    pub fn from_scores(labels: &[String], scores: &[f32]) -> Result<Self> {
        if labels.len() != scores.len() {
            return Err(Error::InvalidInput(format!(
                "{} labels for {} scores",
                labels.len(),
                scores.len()
            )));
        }

        let mut entries: Vec<Classification> = labels
            .iter()
            .zip(scores)
            .map(|(label, &score)| Classification::new(label.clone(), score))
            .collect();
        entries.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&Classification> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Classification> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Classification] {
        &self.entries
    }

    pub fn into_inner(self) -> Vec<Classification> {
        self.entries
    }
}

impl From<Vec<Classification>> for ClassificationBatch {
    fn from(entries: Vec<Classification>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<Classification> for ClassificationBatch {
    fn from_iter<I: IntoIterator<Item = Classification>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ClassificationBatch {
    type Item = &'a Classification;
    type IntoIter = std::slice::Iter<'a, Classification>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome of running the top-k selector over one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Newline-joined `"<label> : <confidence>"` lines.
    pub top_summary: String,
    /// Present only when the top confidence clears the threshold.
    pub winning_label: Option<String>,
}

impl SelectionResult {
    pub fn display_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.winning_label.as_deref().unwrap_or(fallback)
    }

    pub fn summary_lines(&self) -> impl Iterator<Item = &str> {
        self.top_summary.lines()
    }
}
