// tagvision_core/src/estimation/filters.rs

use crate::messages::Detection;

/// Keeps the detections whose ambiguity is at most `max_ambiguity`, in their
/// original order.
///
/// A NaN ambiguity never passes, and a negative or NaN threshold admits nothing.
pub fn filter_ambiguous(detections: &[Detection], max_ambiguity: f64) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| passes(d, max_ambiguity))
        .cloned()
        .collect()
}

/// In-place variant of [`filter_ambiguous`] for callers that own the list.
pub fn retain_unambiguous(detections: &mut Vec<Detection>, max_ambiguity: f64) {
    let before = detections.len();
    detections.retain(|d| passes(d, max_ambiguity));
    if detections.len() < before {
        tracing::debug!(
            dropped = before - detections.len(),
            max_ambiguity,
            "dropped ambiguous detections"
        );
    }
}

fn passes(detection: &Detection, max_ambiguity: f64) -> bool {
    detection.ambiguity <= max_ambiguity
}
