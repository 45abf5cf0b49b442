// Hallucination Tracker Services
// Ingestion, cleaning, detection, persistence and chart data.

pub mod text_processor;
pub mod config_store;
pub mod data_loader;
pub mod detection;
pub mod chart_data;
pub mod pipeline;

pub use text_processor::*;
pub use config_store::*;
pub use data_loader::DataLoader;
pub use chart_data::{build_chart_data, ChartData};
pub use pipeline::{run_pipeline, score_frame, PipelineOptions, PipelineReport};

// Re-export detection module functions
pub use detection::{
    compute_final_score,
    decide_label,
    generate_model_summary,
    risk_score,
    HallucinationDetector,
    ModelAccumulator,
};
