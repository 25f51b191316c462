//! Maps a model's probability vector to a class label and confidence
//! percentage.
//!
//! Most models predict directly over their label list and take a plain
//! argmax. The MS model was trained with four output classes that reduce to
//! two clinical categories, so its paired labels are collapsed by summing.

/// Winning class and its unrounded confidence percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

const NEGATIVE_PAIR: [&str; 2] = ["Negative1", "Negative2"];
const POSITIVE_PAIR: [&str; 2] = ["Positive1", "Positive2"];

fn pair_indices(labels: &[&str], pair: [&str; 2]) -> Option<(usize, usize)> {
    let first = labels.iter().position(|l| *l == pair[0])?;
    let second = labels.iter().position(|l| *l == pair[1])?;
    Some((first, second))
}

/// Applies the post-processing rule to a probability vector.
///
/// Callers must have checked that `probabilities` and `labels` are the same
/// non-zero length.
pub fn postprocess(probabilities: &[f32], labels: &[&str]) -> Prediction {
    if let (Some((n1, n2)), Some((p1, p2))) = (
        pair_indices(labels, NEGATIVE_PAIR),
        pair_indices(labels, POSITIVE_PAIR),
    ) {
        let negative = probabilities[n1] + probabilities[n2];
        let positive = probabilities[p1] + probabilities[p2];
        // Strict >: an exact tie between the sums lands on the positive
        // branch. Kept as-is from the trained deployment.
        return if negative > positive {
            Prediction {
                label: "Negative".to_owned(),
                confidence: negative * 100.0,
            }
        } else {
            Prediction {
                label: "Positive".to_owned(),
                confidence: positive * 100.0,
            }
        };
    }

    // First occurrence wins on ties.
    let mut best = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best] {
            best = i;
        }
    }

    Prediction {
        label: labels[best].to_owned(),
        confidence: probabilities[best] * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disease;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{a} != {b}");
    }

    #[test]
    fn argmax_picks_the_top_label() {
        let labels = Disease::Alzheimer.labels();
        let result = postprocess(&[0.1, 0.2, 0.6, 0.1], labels);
        assert_eq!(result.label, "Not Demented");
        assert_close(result.confidence, 60.0);
    }

    #[test]
    fn argmax_tie_keeps_first_occurrence() {
        let labels = Disease::Cancer.labels();
        let result = postprocess(&[0.4, 0.4, 0.1, 0.1], labels);
        assert_eq!(result.label, "Glioma");
    }

    #[test]
    fn paired_labels_collapse_to_positive() {
        let labels = Disease::Ms.labels();
        let result = postprocess(&[0.1, 0.1, 0.4, 0.4], labels);
        assert_eq!(result.label, "Positive");
        assert_close(result.confidence, 80.0);
    }

    #[test]
    fn paired_labels_collapse_to_negative() {
        let labels = Disease::Ms.labels();
        let result = postprocess(&[0.3, 0.3, 0.2, 0.2], labels);
        assert_eq!(result.label, "Negative");
        assert_close(result.confidence, 60.0);
    }

    #[test]
    fn exact_pair_tie_goes_positive() {
        let labels = Disease::Ms.labels();
        let result = postprocess(&[0.25, 0.25, 0.25, 0.25], labels);
        assert_eq!(result.label, "Positive");
        assert_close(result.confidence, 50.0);
    }

    #[test]
    fn collapse_needs_both_pairs() {
        // A lone Negative pair falls back to argmax.
        let labels = ["Negative1", "Negative2", "Borderline", "Unclear"];
        let result = postprocess(&[0.3, 0.3, 0.35, 0.05], &labels);
        assert_eq!(result.label, "Borderline");
        assert_close(result.confidence, 35.0);
    }
}
