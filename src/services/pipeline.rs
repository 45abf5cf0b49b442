// Batch Pipeline
// load -> clean -> classify -> score -> summarize -> persist

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};
use uuid::Uuid;

use super::chart_data::build_chart_data;
use super::config_store::AppConfig;
use super::data_loader::DataLoader;
use super::detection::{compute_final_score, generate_model_summary, HallucinationDetector};
use super::text_processor::clean_responses;
use crate::error::{DataError, SchemaError};
use crate::models::{Frame, ModelSummary, ResponseRecord, ScoredRecord};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_file: String,
    pub scored_file: String,
    pub summary_file: String,
    pub chart_file: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input_file: "model_responses_raw.csv".to_string(),
            scored_file: "scored_responses.csv".to_string(),
            summary_file: "model_summary.csv".to_string(),
            chart_file: "chart_data.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub run_id: String,
    pub loaded_rows: usize,
    pub scored_rows: usize,
    pub summaries: Vec<ModelSummary>,
    pub outputs: Vec<PathBuf>,
}

/// Classify, score and summarize an in-memory batch. No I/O.
pub fn score_frame(
    detector: &HallucinationDetector,
    frame: &Frame<ResponseRecord>,
) -> Result<(Frame<ScoredRecord>, Vec<ModelSummary>), SchemaError> {
    let classified = detector.analyze(frame)?;
    let scored = compute_final_score(&classified)?;
    let summaries = generate_model_summary(&scored)?;
    Ok((scored, summaries))
}

pub fn run_pipeline(config: &AppConfig, options: &PipelineOptions) -> Result<PipelineReport, DataError> {
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("pipeline", run_id = %run_id);
    let _guard = span.enter();
    let t0 = Instant::now();

    let loader = DataLoader::new(&config.data_dir)?;
    let raw = loader.load_model_responses(&options.input_file)?;
    let cleaned = clean_responses(&raw, config.min_response_chars)?;

    let detector = HallucinationDetector::new(&config.detector);
    let (scored, summaries) = score_frame(&detector, &cleaned)?;

    let chart_data = build_chart_data(scored.rows(), &summaries);
    let outputs = vec![
        loader.save_processed(&scored, &options.scored_file)?,
        loader.save_summary(&summaries, &options.summary_file)?,
        loader.save_json(&chart_data, &options.chart_file)?,
    ];

    info!(
        loaded = raw.len(),
        scored = scored.len(),
        models = summaries.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "pipeline.completed"
    );

    Ok(PipelineReport {
        run_id,
        loaded_rows: raw.len(),
        scored_rows: scored.len(),
        summaries,
        outputs,
    })
}
