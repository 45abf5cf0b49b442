// Error Types
// Schema failures abort a whole batch; everything per-row is total.

use thiserror::Error;

/// A required column is structurally absent from a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required column(s): {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

impl SchemaError {
    pub fn new<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("row {row}: invalid value {value:?} in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to {action} config: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn io(action: &'static str, source: std::io::Error) -> Self {
        Self::Io { action, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = SchemaError::new(["confidence_score", "final_label"]);
        assert_eq!(
            err.to_string(),
            "missing required column(s): confidence_score, final_label"
        );
    }

    #[test]
    fn test_schema_error_converts_into_data_error() {
        let err: DataError = SchemaError::new(["model_name"]).into();
        assert!(matches!(err, DataError::Schema(_)));
    }
}
