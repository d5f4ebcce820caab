use thiserror::Error;

/// Every error kind the engine can produce (spec.md §7). Parsers never raise
/// — they return `None`/`Interpretation::Nd` — so this enum only surfaces at
/// the pipeline, aggregation, and trend-analysis boundaries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Fatal at process start: a missing salt or a missing required fixture
    /// (spec.md §7 "Configuration").
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single row could not be resolved into a Record; the row is skipped
    /// and the pipeline continues (spec.md §7 "Row-level data").
    #[error("row {row} could not be ingested: {message}")]
    RowData { row: usize, message: String },

    /// A structural precondition is missing, e.g. no Profile for an
    /// organism's EUCAST group — fails the current file (spec.md §7 "Domain
    /// violation").
    #[error("domain violation: {0}")]
    Domain(String),

    /// Insufficient data to compute a trend model, e.g. fewer than 3 periods
    /// (spec.md §7 "Insufficient data").
    #[error("insufficient data: {0}")]
    Insufficient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
