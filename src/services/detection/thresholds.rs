// Label thresholds
// Maps a clamped hallucination score onto the three-way label and binary flag.

use crate::models::{FinalLabel, LabelThresholds};

pub fn decide_label(score: f64, thresholds: &LabelThresholds) -> (u8, FinalLabel) {
    if score >= thresholds.hallucinated {
        (1, FinalLabel::Hallucinated)
    } else if score >= thresholds.uncertain {
        (0, FinalLabel::Uncertain)
    } else {
        (0, FinalLabel::Accurate)
    }
}
