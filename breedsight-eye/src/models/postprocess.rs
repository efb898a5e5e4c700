//! Raw model output to ranked classifications

use crate::error::VisionError;
use crate::models::LabelSet;
use breedsight_core::ClassificationBatch;

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Pair scores with labels and rank them by descending confidence
pub fn rank_scores(
    scores: &[f32],
    labels: &LabelSet,
    apply_softmax: bool,
) -> Result<ClassificationBatch, VisionError> {
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(VisionError::Processing("Model produced non-finite scores".to_string()));
    }

    if scores.len() != labels.len() {
        return Err(VisionError::Model(format!(
            "Model produced {} scores but {} labels are configured",
            scores.len(),
            labels.len()
        )));
    }

    let probabilities = if apply_softmax {
        softmax(scores)
    } else {
        scores.to_vec()
    };

    Ok(ClassificationBatch::from_scores(labels.as_slice(), &probabilities)?)
}
