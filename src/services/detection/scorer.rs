// Row Scoring
// Combines detector outputs into a per-row risk score (higher = worse).

use tracing::debug;

use crate::error::SchemaError;
use crate::models::{
    round2, ClassificationResult, ClassifiedRecord, Frame, ScoredRecord, CLASSIFICATION_COLUMNS,
    RISK_SCORE,
};

/// Extra risk carried by a flagged row on top of its inverse confidence.
pub const FLAG_PENALTY: f64 = 0.5;

pub fn risk_score(classification: &ClassificationResult) -> f64 {
    round2(
        (1.0 - classification.confidence_score)
            + f64::from(classification.hallucination_flag) * FLAG_PENALTY,
    )
}

/// Attach `hallucination_risk_score` to every row, preserving order.
pub fn compute_final_score(
    frame: &Frame<ClassifiedRecord>,
) -> Result<Frame<ScoredRecord>, SchemaError> {
    frame.require(&CLASSIFICATION_COLUMNS)?;

    let rows: Vec<ScoredRecord> = frame
        .rows()
        .iter()
        .map(|row| ScoredRecord {
            hallucination_risk_score: risk_score(&row.classification),
            classified: row.clone(),
        })
        .collect();

    debug!(rows = rows.len(), "scorer.scored");
    Ok(frame.derive(&[RISK_SCORE], rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinalLabel, ResponseRecord, FINAL_LABEL, MODEL_NAME, RESPONSE_TEXT};

    fn classified(flag: u8, confidence: f64, label: FinalLabel) -> ClassifiedRecord {
        ClassifiedRecord {
            record: ResponseRecord::new("Model-A", "text"),
            classification: ClassificationResult {
                hallucination_flag: flag,
                confidence_score: confidence,
                final_label: label,
            },
        }
    }

    fn full_columns() -> Vec<&'static str> {
        let mut cols = vec![MODEL_NAME, RESPONSE_TEXT];
        cols.extend(CLASSIFICATION_COLUMNS);
        cols
    }

    #[test]
    fn test_risk_score_formula() {
        let rows = vec![
            classified(0, 0.9, FinalLabel::Accurate),
            classified(1, 0.4, FinalLabel::Hallucinated),
            classified(0, 0.8, FinalLabel::Uncertain),
            classified(1, 0.0, FinalLabel::Hallucinated),
        ];
        let frame = Frame::new(full_columns(), rows);
        let scored = compute_final_score(&frame).unwrap();

        let risks: Vec<f64> = scored.rows().iter().map(|r| r.hallucination_risk_score).collect();
        assert_eq!(risks, vec![0.1, 1.1, 0.2, 1.5]);
        assert_eq!(scored.columns().last().map(String::as_str), Some(RISK_SCORE));
    }

    #[test]
    fn test_risk_matches_rounded_formula_for_every_row() {
        let detector = crate::services::detection::HallucinationDetector::default();
        for text in ["Yes.", "Approximately 42", "It seems fine to me overall, really."] {
            let c = detector.score_response(text);
            let expected =
                round2((1.0 - c.confidence_score) + f64::from(c.hallucination_flag) * 0.5);
            assert_eq!(risk_score(&c), expected);
            assert!(risk_score(&c) >= 0.0);
        }
    }

    #[test]
    fn test_missing_classification_columns_fail_before_scoring() {
        let frame = Frame::new(
            [MODEL_NAME, RESPONSE_TEXT, FINAL_LABEL],
            vec![classified(0, 1.0, FinalLabel::Accurate)],
        );
        let err = compute_final_score(&frame).unwrap_err();
        assert_eq!(err.missing, vec!["hallucination_flag", "confidence_score"]);
    }

    #[test]
    fn test_empty_frame_scores_to_empty() {
        let frame: Frame<ClassifiedRecord> = Frame::new(full_columns(), vec![]);
        assert!(compute_final_score(&frame).unwrap().is_empty());
    }
}
