// Detection Module
// Hallucination classification core organized into specialized submodules:
// - detector: Per-response heuristic classification
// - thresholds: Score-to-label mapping
// - scorer: Per-row risk scoring
// - aggregation: Per-model summary metrics

pub mod detector;
pub mod thresholds;
pub mod scorer;
pub mod aggregation;

pub use detector::HallucinationDetector;
pub use thresholds::decide_label;
pub use scorer::{compute_final_score, risk_score, FLAG_PENALTY};
pub use aggregation::{
    accumulate,
    finish_groups,
    generate_model_summary,
    merge_groups,
    ModelAccumulator,
    ModelGroups,
};
