//! Top-k confidence selection over classifier output

use crate::config::SelectorConfig;
use crate::error::{Error, Result};
use crate::types::{ClassificationBatch, SelectionResult};

/// Turns a confidence-ordered batch into a display summary and an optional
/// winning label.
///
/// Stateless: the same batch always produces the same result, and a single
/// selector can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct TopKSelector {
    top_k: usize,
    threshold: f32,
}

impl Default for TopKSelector {
    fn default() -> Self {
        Self::from_config(&SelectorConfig::default())
    }
}

impl TopKSelector {
    pub fn new(top_k: usize, threshold: f32) -> Self {
        Self {
            top_k: top_k.max(1),
            threshold,
        }
    }

    pub fn from_config(config: &SelectorConfig) -> Self {
        Self::new(config.top_k, config.confidence_threshold)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Select the display set and winner for `batch`.
    ///
    /// Fails with [`Error::NoResults`] on an empty batch and with
    /// [`Error::InvalidInput`] if any entry carries a confidence outside
    /// [0, 1]. The batch is trusted to already be in descending order.
    pub fn select(&self, batch: &ClassificationBatch) -> Result<SelectionResult> {
        if batch.is_empty() {
            return Err(Error::NoResults);
        }

        for classification in batch {
            classification.validate()?;
        }

        let top_summary = batch
            .iter()
            .take(self.top_k)
            .map(|c| format!("{} : {:.2}", c.label, c.confidence))
            .collect::<Vec<_>>()
            .join("\n");

        let winning_label = batch
            .first()
            .filter(|top| top.confidence > self.threshold)
            .map(|top| top.label.clone());

        Ok(SelectionResult {
            top_summary,
            winning_label,
        })
    }
}

/// Run the selector with default settings (top 3, threshold 0.01).
pub fn select_top_k(batch: &ClassificationBatch) -> Result<SelectionResult> {
    TopKSelector::default().select(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Classification;

    fn batch(entries: &[(&str, f32)]) -> ClassificationBatch {
        entries
            .iter()
            .map(|(label, confidence)| Classification::new(*label, *confidence))
            .collect()
    }

    #[test]
    fn test_select_four_entries() {
        let b = batch(&[("beagle", 0.92), ("pug", 0.05), ("boxer", 0.02), ("husky", 0.01)]);
        let result = select_top_k(&b).unwrap();
        assert_eq!(result.top_summary, "beagle : 0.92\npug : 0.05\nboxer : 0.02");
        assert_eq!(result.winning_label.as_deref(), Some("beagle"));
    }

    #[test]
    fn test_select_below_threshold() {
        let b = batch(&[("beagle", 0.008)]);
        let result = select_top_k(&b).unwrap();
        assert_eq!(result.top_summary, "beagle : 0.01");
        assert_eq!(result.winning_label, None);
        assert_eq!(result.display_label("Unknown"), "Unknown");
    }

    #[test]
    fn test_select_exactly_at_threshold_has_no_winner() {
        let b = batch(&[("beagle", 0.01)]);
        let result = select_top_k(&b).unwrap();
        assert_eq!(result.winning_label, None);
    }

    #[test]
    fn test_select_just_above_threshold_wins() {
        let b = batch(&[("beagle", 0.012)]);
        let result = select_top_k(&b).unwrap();
        assert_eq!(result.winning_label.as_deref(), Some("beagle"));
    }

    #[test]
    fn test_select_empty() {
        let result = select_top_k(&ClassificationBatch::empty());
        assert!(matches!(result, Err(Error::NoResults)));
    }

    #[test]
    fn test_select_two_entries() {
        let b = batch(&[("pug", 0.6), ("boxer", 0.4)]);
        let result = select_top_k(&b).unwrap();
        assert_eq!(result.summary_lines().count(), 2);
        assert_eq!(result.top_summary, "pug : 0.60\nboxer : 0.40");
    }

    #[test]
    fn test_select_rejects_out_of_range_anywhere_in_batch() {
        let b = batch(&[("beagle", 0.9), ("pug", 0.05), ("boxer", 0.02), ("husky", -0.5)]);
        assert!(matches!(select_top_k(&b), Err(Error::InvalidInput(_))));

        let b = batch(&[("beagle", 1.2)]);
        assert!(matches!(select_top_k(&b), Err(Error::InvalidInput(_))));

        let b = batch(&[("beagle", f32::NAN)]);
        assert!(matches!(select_top_k(&b), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_select_rejects_multiline_label() {
        let b = batch(&[("beagle", 0.9), ("pug\nboxer", 0.05)]);
        assert!(matches!(select_top_k(&b), Err(Error::InvalidInput(_))));

        // Rejected even outside the displayed entries
        let b = batch(&[("beagle", 0.9), ("pug", 0.05), ("boxer", 0.02), ("husky\r", 0.01)]);
        assert!(matches!(select_top_k(&b), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_custom_top_k_and_threshold() {
        let selector = TopKSelector::new(1, 0.5);
        let b = batch(&[("beagle", 0.45), ("pug", 0.40)]);
        let result = selector.select(&b).unwrap();
        assert_eq!(result.top_summary, "beagle : 0.45");
        assert_eq!(result.winning_label, None);
    }

    #[test]
    fn test_zero_top_k_is_clamped() {
        let selector = TopKSelector::new(0, 0.01);
        assert_eq!(selector.top_k(), 1);
    }

    #[test]
    fn test_select_is_idempotent() {
        let b = batch(&[("beagle", 0.92), ("pug", 0.05)]);
        let selector = TopKSelector::default();
        assert_eq!(selector.select(&b).unwrap(), selector.select(&b).unwrap());
    }
}
