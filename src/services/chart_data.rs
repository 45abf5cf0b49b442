// Chart Data
// Series behind the standard report charts. Rendering happens elsewhere.

use serde::{Deserialize, Serialize};

use crate::models::{FinalLabel, ModelSummary, ScoredRecord};

pub const CONFIDENCE_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBar {
    pub model_name: String,
    pub hallucination_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary of risk scores for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDistribution {
    pub label: FinalLabel,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub hallucination_rate: Vec<RateBar>,
    pub confidence_distribution: Vec<HistogramBin>,
    pub risk_by_label: Vec<LabelDistribution>,
}

pub fn build_chart_data(scored: &[ScoredRecord], summaries: &[ModelSummary]) -> ChartData {
    let confidences: Vec<f64> = scored
        .iter()
        .map(|r| r.classification().confidence_score)
        .collect();

    ChartData {
        hallucination_rate: hallucination_rate_bars(summaries),
        confidence_distribution: histogram(&confidences, CONFIDENCE_BINS),
        risk_by_label: risk_by_label(scored),
    }
}

pub fn hallucination_rate_bars(summaries: &[ModelSummary]) -> Vec<RateBar> {
    summaries
        .iter()
        .map(|s| RateBar {
            model_name: s.model_name.clone(),
            hallucination_rate: s.hallucination_rate,
        })
        .collect()
}

/// Equal-width bins over the observed range; the last bin is closed. A
/// degenerate range is widened by 0.5 on each side.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Quantile with linear interpolation between closest ranks. `sorted` must be
/// non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Labels in first-appearance order.
pub fn risk_by_label(scored: &[ScoredRecord]) -> Vec<LabelDistribution> {
    let mut groups: Vec<(FinalLabel, Vec<f64>)> = Vec::new();
    for row in scored {
        let label = row.classification().final_label;
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, risks)) => risks.push(row.hallucination_risk_score),
            None => groups.push((label, vec![row.hallucination_risk_score])),
        }
    }

    groups
        .into_iter()
        .map(|(label, mut risks)| {
            risks.sort_by(|a, b| a.total_cmp(b));
            LabelDistribution {
                label,
                count: risks.len(),
                min: risks[0],
                q1: quantile(&risks, 0.25),
                median: quantile(&risks, 0.5),
                q3: quantile(&risks, 0.75),
                max: risks[risks.len() - 1],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationResult, ClassifiedRecord, ResponseRecord};

    fn scored(label: FinalLabel, confidence: f64, risk: f64) -> ScoredRecord {
        ScoredRecord {
            classified: ClassifiedRecord {
                record: ResponseRecord::new("Model-A", "text"),
                classification: ClassificationResult {
                    hallucination_flag: u8::from(label == FinalLabel::Hallucinated),
                    confidence_score: confidence,
                    final_label: label,
                },
            },
            hallucination_risk_score: risk,
        }
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 0.1, 0.5, 0.5, 1.0];
        let bins = histogram(&values, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[5].count, 2);
        assert_eq!(bins[9].count, 1);
        assert_eq!(bins[9].upper, 1.0);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let bins = histogram(&[0.7, 0.7], 10);
        assert!((bins[0].lower - 0.2).abs() < 1e-9);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_risk_by_label_five_numbers() {
        let rows = vec![
            scored(FinalLabel::Hallucinated, 0.4, 1.1),
            scored(FinalLabel::Accurate, 1.0, 0.0),
            scored(FinalLabel::Hallucinated, 0.1, 1.4),
            scored(FinalLabel::Hallucinated, 0.3, 1.2),
            scored(FinalLabel::Hallucinated, 0.2, 1.3),
        ];
        let dist = risk_by_label(&rows);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].label, FinalLabel::Hallucinated);
        assert_eq!(dist[0].count, 4);
        assert_eq!(dist[0].min, 1.1);
        assert_eq!(dist[0].max, 1.4);
        assert!((dist[0].median - 1.25).abs() < 1e-9);
        assert!((dist[0].q1 - 1.175).abs() < 1e-9);
        assert_eq!(dist[1].label, FinalLabel::Accurate);
        assert_eq!(dist[1].median, 0.0);
    }

    #[test]
    fn test_chart_data_serializes_camel_case() {
        let rows = vec![scored(FinalLabel::Accurate, 1.0, 0.0)];
        let summaries = vec![ModelSummary {
            model_name: "Model-A".to_string(),
            total_responses: 1,
            hallucinated_count: 0,
            uncertain_count: 0,
            avg_confidence_score: 1.0,
            avg_risk_score: 0.0,
            hallucination_rate: 0.0,
        }];
        let data = build_chart_data(&rows, &summaries);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["hallucinationRate"][0]["modelName"], "Model-A");
        assert_eq!(json["riskByLabel"][0]["label"], "accurate");
        assert_eq!(json["confidenceDistribution"].as_array().unwrap().len(), 10);
    }
}
