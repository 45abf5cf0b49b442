// Aggregation Logic
// Groups scored rows by model into summary metrics.
//
// Each group is reduced into a `ModelAccumulator` (counts + running sums).
// Accumulators merge associatively, so partial groupings built over any split
// of the rows combine into the same summary; only `finish` divides.

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SchemaError;
use crate::models::{round2, FinalLabel, Frame, ModelSummary, ScoredRecord, MODEL_NAME};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelAccumulator {
    pub total: usize,
    pub hallucinated: usize,
    pub uncertain: usize,
    pub confidence_sum: f64,
    pub risk_sum: f64,
}

impl ModelAccumulator {
    pub fn push(&mut self, row: &ScoredRecord) {
        let classification = row.classification();
        self.total += 1;
        match classification.final_label {
            FinalLabel::Hallucinated => self.hallucinated += 1,
            FinalLabel::Uncertain => self.uncertain += 1,
            FinalLabel::Accurate => {}
        }
        self.confidence_sum += classification.confidence_score;
        self.risk_sum += row.hallucination_risk_score;
    }

    pub fn merge(&mut self, other: &ModelAccumulator) {
        self.total += other.total;
        self.hallucinated += other.hallucinated;
        self.uncertain += other.uncertain;
        self.confidence_sum += other.confidence_sum;
        self.risk_sum += other.risk_sum;
    }

    /// `None` for an empty accumulator; a summary always covers at least one row.
    pub fn finish(&self, model_name: &str) -> Option<ModelSummary> {
        if self.total == 0 {
            return None;
        }
        let n = self.total as f64;
        Some(ModelSummary {
            model_name: model_name.to_string(),
            total_responses: self.total,
            hallucinated_count: self.hallucinated,
            uncertain_count: self.uncertain,
            avg_confidence_score: self.confidence_sum / n,
            avg_risk_score: self.risk_sum / n,
            hallucination_rate: round2(self.hallucinated as f64 / n),
        })
    }
}

pub type ModelGroups = BTreeMap<String, ModelAccumulator>;

/// Partial grouping over a slice of rows. Rows with an empty model name are
/// left out of every group.
pub fn accumulate(rows: &[ScoredRecord]) -> ModelGroups {
    let mut groups = ModelGroups::new();
    for row in rows {
        if let Some(model) = row.record().model() {
            groups.entry(model.to_string()).or_default().push(row);
        }
    }
    groups
}

pub fn merge_groups(mut into: ModelGroups, other: &ModelGroups) -> ModelGroups {
    for (model, acc) in other {
        into.entry(model.clone()).or_default().merge(acc);
    }
    into
}

/// One summary per model, ordered by model name.
pub fn finish_groups(groups: &ModelGroups) -> Vec<ModelSummary> {
    groups
        .iter()
        .filter_map(|(model, acc)| acc.finish(model))
        .collect()
}

pub fn generate_model_summary(
    frame: &Frame<ScoredRecord>,
) -> Result<Vec<ModelSummary>, SchemaError> {
    frame.require(&[MODEL_NAME])?;

    let groups = accumulate(frame.rows());
    let skipped = frame.len() - groups.values().map(|g| g.total).sum::<usize>();
    if skipped > 0 {
        debug!(skipped, "aggregation.rows_without_model");
    }

    let summaries = finish_groups(&groups);
    debug!(models = summaries.len(), rows = frame.len(), "aggregation.summarized");
    Ok(summaries)
}
