use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems surfaced when a config is compiled into a rule engine.
/// Scans never see these: an engine only exists for a validated config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {table} pattern #{index} `{pattern}`: {source}")]
    InvalidPattern {
        table: &'static str,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{table} pattern #{index} `{pattern}` matches an empty line")]
    MatchesEmptyLine {
        table: &'static str,
        index: usize,
        pattern: String,
    },
    #[error("header rule table is empty")]
    EmptyHeaderTable,
    #[error("unknown rule target `{0}` (expected a label token or STOP)")]
    UnknownTarget(String),
    #[error("unknown label `{0}`")]
    UnknownLabel(String),
    #[error("{field} must be at least {min}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: usize,
        value: usize,
    },
}

/// Failure reported by a text extraction backend. Always per-document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    NotText { path: PathBuf },
    #[error("no extractor supports {path}")]
    Unsupported { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("segmentation exceeded {limit_ms}ms after {lines_scanned} lines")]
    Timeout { limit_ms: u64, lines_scanned: usize },
}

/// Why a single document produced no records. Never aborts a batch.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
