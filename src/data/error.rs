use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fatal load errors
// ---------------------------------------------------------------------------

/// A failure that aborts loading the whole dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON layout: {0}")]
    InvalidJson(String),

    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-row parse errors (non-fatal, the row is dropped)
// ---------------------------------------------------------------------------

/// Why a single source row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing value in column {column}")]
    MissingValue { column: &'static str },

    #[error("unparseable date {0:?}")]
    InvalidDate(String),

    #[error("quantity {0:?} is not a non-negative integer")]
    InvalidQuantity(String),

    #[error("price {0:?} is not a non-negative number")]
    InvalidPrice(String),

    #[error("malformed row: {0}")]
    Malformed(String),
}

/// Coarse reason buckets used for the drop counters in a load report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingValue,
    InvalidDate,
    InvalidQuantity,
    InvalidPrice,
    Malformed,
}

impl ParseError {
    pub fn reason(&self) -> DropReason {
        match self {
            ParseError::MissingValue { .. } => DropReason::MissingValue,
            ParseError::InvalidDate(_) => DropReason::InvalidDate,
            ParseError::InvalidQuantity(_) => DropReason::InvalidQuantity,
            ParseError::InvalidPrice(_) => DropReason::InvalidPrice,
            ParseError::Malformed(_) => DropReason::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_name() {
        let err = LoadError::MissingColumns(vec!["Date".into(), "Price".into()]);
        assert_eq!(err.to_string(), "missing required column(s): Date, Price");
    }

    #[test]
    fn parse_errors_map_to_reasons() {
        assert_eq!(
            ParseError::MissingValue { column: "Region" }.reason(),
            DropReason::MissingValue
        );
        assert_eq!(
            ParseError::InvalidDate("tomorrow".into()).reason(),
            DropReason::InvalidDate
        );
        assert_eq!(
            ParseError::InvalidPrice("-1".into()).reason(),
            DropReason::InvalidPrice
        );
    }
}
