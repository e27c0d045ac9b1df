use thiserror::Error;

/// Validation and configuration errors exposed by `ferromacro-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("indicator name cannot be empty")]
    EmptyIndicatorName,
    #[error("indicator '{name}' is registered more than once")]
    DuplicateIndicator { name: String },

    #[error("invalid source '{value}', expected one of yahoo, bcb")]
    InvalidSource { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date window start {start} is after end {end}")]
    InvertedWindow { start: String, end: String },

    #[error("invalid value '{value}' for {key}")]
    InvalidConfig { key: &'static str, value: String },
}

/// Failure surfaced by the acquisition facade.
///
/// Upstream faults never appear here; they degrade to an empty series.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("unknown indicator '{name}'")]
    UnknownIndicator { name: String },
}

/// Raw adapter output that cannot be shaped into a time series.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("value column '{column}' is missing from raw series")]
    MissingColumn { column: String },
    #[error("row {index} has {found} values, expected {expected}")]
    RowWidth {
        index: usize,
        expected: usize,
        found: usize,
    },
}
