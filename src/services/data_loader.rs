// Data Loader Service
// CSV ingestion from `raw/` and persistence into `processed/`.

use indexmap::IndexMap;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::DataError;
use crate::models::{
    ClassificationResult, ClassifiedRecord, FinalLabel, Frame, ModelSummary, ResponseRecord,
    ScoredRecord, CLASSIFICATION_COLUMNS, CONFIDENCE_SCORE, FINAL_LABEL, HALLUCINATION_FLAG,
    MODEL_NAME, RESPONSE_TEXT, RISK_SCORE, SUMMARY_COLUMNS,
};

/// Untyped CSV row keyed by header, in column order.
pub type Row = IndexMap<String, String>;

pub struct DataLoader {
    raw_path: PathBuf,
    processed_path: PathBuf,
}

impl DataLoader {
    /// Ensures `raw/` and `processed/` exist under `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, DataError> {
        let base_path = base_path.as_ref();
        let raw_path = base_path.join("raw");
        let processed_path = base_path.join("processed");
        fs::create_dir_all(&raw_path)?;
        fs::create_dir_all(&processed_path)?;
        Ok(Self { raw_path, processed_path })
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn processed_path(&self) -> &Path {
        &self.processed_path
    }

    fn raw_file(&self, filename: &str) -> Result<PathBuf, DataError> {
        let path = self.raw_path.join(filename);
        if !path.exists() {
            return Err(DataError::NotFound(format!("{} in {}", filename, self.raw_path.display())));
        }
        Ok(path)
    }

    pub fn load_questions(&self, filename: &str) -> Result<Frame<Row>, DataError> {
        read_table(&self.raw_file(filename)?)
    }

    pub fn load_model_responses(&self, filename: &str) -> Result<Frame<ResponseRecord>, DataError> {
        let path = self.raw_file(filename)?;
        let frame = read_responses(&path)?;
        info!(path = %path.display(), rows = frame.len(), "responses.loaded");
        Ok(frame)
    }

    pub fn save_processed<R: CsvRow>(&self, frame: &Frame<R>, filename: &str) -> Result<PathBuf, DataError> {
        let path = self.processed_path.join(filename);
        write_frame(frame, &path)?;
        info!(path = %path.display(), rows = frame.len(), "processed.saved");
        Ok(path)
    }

    pub fn save_summary(&self, summaries: &[ModelSummary], filename: &str) -> Result<PathBuf, DataError> {
        let path = self.processed_path.join(filename);
        write_summary(summaries, &path)?;
        info!(path = %path.display(), models = summaries.len(), "summary.saved");
        Ok(path)
    }

    pub fn save_json<T: Serialize>(&self, value: &T, filename: &str) -> Result<PathBuf, DataError> {
        let path = self.processed_path.join(filename);
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        info!(path = %path.display(), "json.saved");
        Ok(path)
    }
}

// ============ Reading ============

/// Read a headed CSV. Short records are padded with empty (missing) cells;
/// cells beyond the header are dropped.
pub fn read_table(path: &Path) -> Result<Frame<Row>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(File::open(path)?);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cells = record.iter().map(str::to_string).chain(std::iter::repeat(String::new()));
        let row: Row = headers.iter().cloned().zip(cells).collect();
        rows.push(row);
    }

    Ok(Frame::new(headers, rows))
}

/// Empty cells are missing values.
fn take_cell(row: &mut Row, column: &str) -> Option<String> {
    row.shift_remove(column).filter(|v| !v.is_empty())
}

fn record_from_row(mut row: Row) -> ResponseRecord {
    ResponseRecord {
        response_text: take_cell(&mut row, RESPONSE_TEXT),
        model_name: take_cell(&mut row, MODEL_NAME),
        extra: row,
    }
}

pub fn read_responses(path: &Path) -> Result<Frame<ResponseRecord>, DataError> {
    let table = read_table(path)?;
    let columns = table.columns().to_vec();
    let rows = table.into_rows().into_iter().map(record_from_row).collect();
    Ok(Frame::new(columns, rows))
}

fn invalid(row: usize, column: &str, value: &str) -> DataError {
    DataError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_float(row: &mut Row, idx: usize, column: &str) -> Result<f64, DataError> {
    let value = take_cell(row, column).unwrap_or_default();
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(idx, column, &value))
}

fn classification_from_row(row: &mut Row, idx: usize) -> Result<ClassificationResult, DataError> {
    let flag = parse_float(row, idx, HALLUCINATION_FLAG)?;
    if flag != 0.0 && flag != 1.0 {
        return Err(invalid(idx, HALLUCINATION_FLAG, &flag.to_string()));
    }
    let confidence_score = parse_float(row, idx, CONFIDENCE_SCORE)?;
    let label = take_cell(row, FINAL_LABEL).unwrap_or_default();
    let final_label: FinalLabel = label.parse().map_err(|_| invalid(idx, FINAL_LABEL, &label))?;

    Ok(ClassificationResult {
        hallucination_flag: flag as u8,
        confidence_score,
        final_label,
    })
}

/// Re-read a classified CSV. The classification columns must all be present.
pub fn read_classified(path: &Path) -> Result<Frame<ClassifiedRecord>, DataError> {
    let table = read_table(path)?;
    table.require(&CLASSIFICATION_COLUMNS)?;

    let columns = table.columns().to_vec();
    let mut rows = Vec::with_capacity(table.len());
    for (idx, mut row) in table.into_rows().into_iter().enumerate() {
        let classification = classification_from_row(&mut row, idx)?;
        rows.push(ClassifiedRecord {
            record: record_from_row(row),
            classification,
        });
    }
    Ok(Frame::new(columns, rows))
}

/// Re-read a scored CSV, as written by `save_processed`.
pub fn read_scored(path: &Path) -> Result<Frame<ScoredRecord>, DataError> {
    let table = read_table(path)?;
    let mut required: Vec<&str> = CLASSIFICATION_COLUMNS.to_vec();
    required.push(RISK_SCORE);
    table.require(&required)?;

    let columns = table.columns().to_vec();
    let mut rows = Vec::with_capacity(table.len());
    for (idx, mut row) in table.into_rows().into_iter().enumerate() {
        let hallucination_risk_score = parse_float(&mut row, idx, RISK_SCORE)?;
        let classification = classification_from_row(&mut row, idx)?;
        rows.push(ScoredRecord {
            classified: ClassifiedRecord {
                record: record_from_row(row),
                classification,
            },
            hallucination_risk_score,
        });
    }
    Ok(Frame::new(columns, rows))
}

// ============ Writing ============

/// Cell lookup by column name for CSV output.
pub trait CsvRow {
    fn cell(&self, column: &str) -> String;
}

/// Integral floats keep a trailing `.0` so columns stay visibly numeric.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl CsvRow for Row {
    fn cell(&self, column: &str) -> String {
        self.get(column).cloned().unwrap_or_default()
    }
}

impl CsvRow for ResponseRecord {
    fn cell(&self, column: &str) -> String {
        match column {
            RESPONSE_TEXT => self.response_text.clone().unwrap_or_default(),
            MODEL_NAME => self.model_name.clone().unwrap_or_default(),
            _ => self.extra.get(column).cloned().unwrap_or_default(),
        }
    }
}

impl CsvRow for ClassifiedRecord {
    fn cell(&self, column: &str) -> String {
        match column {
            HALLUCINATION_FLAG => self.classification.hallucination_flag.to_string(),
            CONFIDENCE_SCORE => format_float(self.classification.confidence_score),
            FINAL_LABEL => self.classification.final_label.to_string(),
            _ => self.record.cell(column),
        }
    }
}

impl CsvRow for ScoredRecord {
    fn cell(&self, column: &str) -> String {
        match column {
            RISK_SCORE => format_float(self.hallucination_risk_score),
            _ => self.classified.cell(column),
        }
    }
}

pub fn write_frame<R: CsvRow>(frame: &Frame<R>, path: &Path) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(frame.columns())?;
    for row in frame.rows() {
        wtr.write_record(frame.columns().iter().map(|c| row.cell(c)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// The header is written even when there are no summaries.
pub fn write_summary(summaries: &[ModelSummary], path: &Path) -> Result<(), DataError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(SUMMARY_COLUMNS)?;
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}
