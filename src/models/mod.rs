// Hallucination Tracker Data Models
// Typed rows and the ordered frame that carries them between stages.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::SchemaError;

// ============ Column Names ============

pub const RESPONSE_TEXT: &str = "response_text";
pub const MODEL_NAME: &str = "model_name";
pub const HALLUCINATION_FLAG: &str = "hallucination_flag";
pub const CONFIDENCE_SCORE: &str = "confidence_score";
pub const FINAL_LABEL: &str = "final_label";
pub const RISK_SCORE: &str = "hallucination_risk_score";

/// Columns added by classification, in output order.
pub const CLASSIFICATION_COLUMNS: [&str; 3] = [HALLUCINATION_FLAG, CONFIDENCE_SCORE, FINAL_LABEL];

pub const SUMMARY_COLUMNS: [&str; 7] = [
    MODEL_NAME,
    "total_responses",
    "hallucinated_count",
    "uncertain_count",
    "avg_confidence_score",
    "avg_risk_score",
    "hallucination_rate",
];

/// Round half-to-even at two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ============ Frame ============

/// Ordered rows plus the column list describing their shape.
///
/// Schema checks look at `columns`, never at row values: a declared column
/// with an empty cell is still present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame<R> {
    columns: Vec<String>,
    rows: Vec<R>,
}

impl<R> Frame<R> {
    pub fn new<I, S>(columns: I, rows: Vec<R>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for col in columns {
            let col = col.into();
            if !out.contains(&col) {
                out.push(col);
            }
        }
        Self { columns: out, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with every absent column listed, in the order requested.
    pub fn require(&self, names: &[&str]) -> Result<(), SchemaError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.has_column(n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(missing))
        }
    }

    /// Build a frame of `T` with this frame's columns plus `added` appended.
    pub fn derive<T>(&self, added: &[&str], rows: Vec<T>) -> Frame<T> {
        let columns = self
            .columns
            .iter()
            .map(String::as_str)
            .chain(added.iter().copied());
        Frame::new(columns, rows)
    }
}

// ============ Response Input ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// `None` is a missing cell, read as the empty string.
    pub response_text: Option<String>,
    pub model_name: Option<String>,
    /// Auxiliary columns, carried through untouched in source order.
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl ResponseRecord {
    pub fn new(model_name: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            response_text: Some(response_text.into()),
            model_name: Some(model_name.into()),
            extra: IndexMap::new(),
        }
    }

    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(column.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        self.response_text.as_deref().unwrap_or("")
    }

    pub fn model(&self) -> Option<&str> {
        self.model_name.as_deref().filter(|m| !m.is_empty())
    }
}

// ============ Classification ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalLabel {
    Accurate,
    Uncertain,
    Hallucinated,
}

impl FinalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accurate => "accurate",
            Self::Uncertain => "uncertain",
            Self::Hallucinated => "hallucinated",
        }
    }
}

impl fmt::Display for FinalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label: {0:?}")]
pub struct UnknownLabel(pub String);

impl FromStr for FinalLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accurate" => Ok(Self::Accurate),
            "uncertain" => Ok(Self::Uncertain),
            "hallucinated" => Ok(Self::Hallucinated),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub hallucination_flag: u8,
    pub confidence_score: f64,
    pub final_label: FinalLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: ResponseRecord,
    #[serde(flatten)]
    pub classification: ClassificationResult,
}

// ============ Scoring ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub classified: ClassifiedRecord,
    pub hallucination_risk_score: f64,
}

impl ScoredRecord {
    pub fn record(&self) -> &ResponseRecord {
        &self.classified.record
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classified.classification
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub total_responses: usize,
    pub hallucinated_count: usize,
    pub uncertain_count: usize,
    pub avg_confidence_score: f64,
    pub avg_risk_score: f64,
    pub hallucination_rate: f64,
}

// ============ Label Thresholds ============

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelThresholds {
    #[serde(default = "default_hallucinated")]
    pub hallucinated: f64,
    #[serde(default = "default_uncertain")]
    pub uncertain: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            hallucinated: 0.6,
            uncertain: 0.4,
        }
    }
}

// ============ Default Value Functions ============

fn default_hallucinated() -> f64 { 0.6 }
fn default_uncertain() -> f64 { 0.4 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(1.0 - 0.6000000000000001), 0.4);
        assert_eq!(round2(0.5), 0.5);
    }

    #[test]
    fn test_frame_dedupes_columns_and_requires() {
        let frame: Frame<ResponseRecord> =
            Frame::new([MODEL_NAME, RESPONSE_TEXT, MODEL_NAME], vec![]);
        assert_eq!(frame.columns().len(), 2);
        assert!(frame.require(&[RESPONSE_TEXT]).is_ok());

        let err = frame.require(&[HALLUCINATION_FLAG, MODEL_NAME, FINAL_LABEL]).unwrap_err();
        assert_eq!(err.missing, vec![HALLUCINATION_FLAG, FINAL_LABEL]);
    }

    #[test]
    fn test_frame_derive_appends_columns() {
        let frame = Frame::new([RESPONSE_TEXT, "question_id"], vec![1, 2]);
        let derived = frame.derive(&[RISK_SCORE], vec!["a", "b"]);
        assert_eq!(derived.columns(), &[RESPONSE_TEXT, "question_id", RISK_SCORE]);
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn test_label_parse_and_display() {
        assert_eq!(" Hallucinated ".parse::<FinalLabel>().unwrap(), FinalLabel::Hallucinated);
        assert_eq!(FinalLabel::Uncertain.to_string(), "uncertain");
        assert!("maybe".parse::<FinalLabel>().is_err());
    }

    #[test]
    fn test_record_missing_text_reads_empty() {
        let record = ResponseRecord::default();
        assert_eq!(record.text(), "");
        assert_eq!(record.model(), None);
    }

    #[test]
    fn test_classified_record_serializes_flat() {
        let row = ClassifiedRecord {
            record: ResponseRecord::new("Model-A", "Paris.").with_extra("question_id", "q1"),
            classification: ClassificationResult {
                hallucination_flag: 0,
                confidence_score: 0.7,
                final_label: FinalLabel::Accurate,
            },
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["question_id"], "q1");
        assert_eq!(json["final_label"], "accurate");
        assert_eq!(json["model_name"], "Model-A");
    }
}
