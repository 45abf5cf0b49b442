//! Hallucination Tracker CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use hallucination_tracker_lib::{
    init_logging,
    models::MODEL_NAME,
    services::{
        data_loader::read_scored,
        generate_model_summary,
        run_pipeline,
        AppConfig,
        ConfigStore,
        HallucinationDetector,
        PipelineOptions,
    },
};

#[derive(Parser)]
#[command(name = "hallucination-tracker")]
#[command(about = "Heuristic hallucination classification and per-model risk metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding raw/ and processed/ (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, classify, score and summarize a raw responses CSV
    Run {
        /// File name under raw/
        #[arg(short, long, default_value = "model_responses_raw.csv")]
        input: String,

        /// Scored rows file name under processed/
        #[arg(long, default_value = "scored_responses.csv")]
        scored: String,

        /// Model summary file name under processed/
        #[arg(long, default_value = "model_summary.csv")]
        summary: String,

        /// Chart dataset file name under processed/
        #[arg(long, default_value = "chart_data.json")]
        chart: String,
    },

    /// Classify a single response and print the result as JSON
    Classify {
        #[arg(short, long)]
        text: String,
    },

    /// Re-aggregate a previously scored CSV
    Summarize {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the default configuration file
    InitConfig,
}

fn config_store(cli: &Cli) -> Result<ConfigStore> {
    match &cli.config {
        Some(path) => Ok(ConfigStore::from_file(path.clone())),
        None => ConfigStore::default_config_dir()
            .map(ConfigStore::new)
            .context("no platform config directory; pass --config"),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let store = config_store(cli)?;
    let mut config = store
        .load()
        .with_context(|| format!("loading {}", store.config_file().display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Run { input, scored, summary, chart } => {
            let config = load_config(&cli)?;
            let options = PipelineOptions {
                input_file: input.clone(),
                scored_file: scored.clone(),
                summary_file: summary.clone(),
                chart_file: chart.clone(),
            };
            let report = run_pipeline(&config, &options).context("pipeline failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Classify { text } => {
            let config = load_config(&cli)?;
            let detector = HallucinationDetector::new(&config.detector);
            let result = detector.score_response(text);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Summarize { input } => {
            let scored = read_scored(input).with_context(|| format!("reading {}", input.display()))?;
            let summaries = generate_model_summary(&scored)
                .with_context(|| format!("{} has no {} column", input.display(), MODEL_NAME))?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::InitConfig => {
            let store = config_store(&cli)?;
            store.save(&AppConfig::default())?;
            info!(path = %store.config_file().display(), "config.written");
            println!("Wrote {}", store.config_file().display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_output_names_default_to_pipeline_defaults() {
        let cli = Cli::try_parse_from(["hallucination-tracker", "run"]).unwrap();
        let defaults = PipelineOptions::default();
        match cli.command {
            Commands::Run { input, scored, summary, chart } => {
                assert_eq!(input, defaults.input_file);
                assert_eq!(scored, defaults.scored_file);
                assert_eq!(summary, defaults.summary_file);
                assert_eq!(chart, defaults.chart_file);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_accepts_chart_name() {
        let cli = Cli::try_parse_from([
            "hallucination-tracker",
            "run",
            "--chart",
            "charts.json",
            "--data-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("out")));
        match cli.command {
            Commands::Run { chart, .. } => assert_eq!(chart, "charts.json"),
            _ => panic!("expected run"),
        }
    }
}
