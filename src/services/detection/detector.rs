// Hallucination Detector
// Keyword, numeric and length heuristics over a single response.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::thresholds::decide_label;
use crate::error::SchemaError;
use crate::models::{
    round2, ClassificationResult, ClassifiedRecord, Frame, LabelThresholds, ResponseRecord,
    CLASSIFICATION_COLUMNS, RESPONSE_TEXT,
};
use crate::services::config_store::DetectorConfig;

fn digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d").expect("digit pattern is valid"))
}

/// Immutable heuristic classifier. Build one per configuration and share it.
#[derive(Debug, Clone)]
pub struct HallucinationDetector {
    phrases: Vec<String>,
    uncertainty_weight: f64,
    numeric_weight: f64,
    short_response_weight: f64,
    short_response_chars: usize,
    thresholds: LabelThresholds,
}

impl Default for HallucinationDetector {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl HallucinationDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        let mut phrases: Vec<String> = Vec::with_capacity(config.uncertainty_phrases.len());
        for phrase in &config.uncertainty_phrases {
            let phrase = phrase.trim().to_lowercase();
            if !phrase.is_empty() && !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }

        Self {
            phrases,
            uncertainty_weight: config.uncertainty_weight,
            numeric_weight: config.numeric_weight,
            short_response_weight: config.short_response_weight,
            short_response_chars: config.short_response_chars,
            thresholds: config.thresholds,
        }
    }

    /// Default weights with a custom phrase list.
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = DetectorConfig {
            uncertainty_phrases: phrases.into_iter().map(Into::into).collect(),
            ..DetectorConfig::default()
        };
        Self::new(&config)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn contains_uncertainty(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.phrases.iter().any(|p| text.contains(p.as_str()))
    }

    /// Numbers and dates are the claims most often fabricated.
    pub fn has_numeric_claim(&self, text: &str) -> bool {
        digit_re().is_match(text)
    }

    /// Raw heuristic score before labeling, capped at 1.0.
    pub fn hallucination_score(&self, response_text: &str) -> f64 {
        let text = response_text.trim().to_lowercase();

        let mut score = 0.0;
        if self.contains_uncertainty(&text) {
            score += self.uncertainty_weight;
        }
        if self.has_numeric_claim(&text) {
            score += self.numeric_weight;
        }
        if text.chars().count() < self.short_response_chars {
            score += self.short_response_weight;
        }

        score.min(1.0)
    }

    pub fn score_response(&self, response_text: &str) -> ClassificationResult {
        let score = self.hallucination_score(response_text);
        let (hallucination_flag, final_label) = decide_label(score, &self.thresholds);

        ClassificationResult {
            hallucination_flag,
            confidence_score: round2(1.0 - score),
            final_label,
        }
    }

    /// Classify every row, preserving order. The text column must be declared
    /// on the frame; missing cell values classify as empty text.
    pub fn analyze(
        &self,
        frame: &Frame<ResponseRecord>,
    ) -> Result<Frame<ClassifiedRecord>, SchemaError> {
        frame.require(&[RESPONSE_TEXT])?;

        let rows: Vec<ClassifiedRecord> = frame
            .rows()
            .iter()
            .map(|record| ClassifiedRecord {
                classification: self.score_response(record.text()),
                record: record.clone(),
            })
            .collect();

        debug!(rows = rows.len(), phrases = self.phrases.len(), "detector.analyzed");
        Ok(frame.derive(&CLASSIFICATION_COLUMNS, rows))
    }
}
