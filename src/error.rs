use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::FieldLocation;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ConsolidateError>;

/// Error type covering the different failure cases that can occur while a
/// run is configured, prepared, or written.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook cannot be materialised sheet by sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Missing workbook, sheet or range, or a source count outside the
    /// supported bounds.
    #[error("{scope}: {message}")]
    Configuration { scope: Scope, message: String },

    /// Raised when an address or range text cannot be parsed.
    #[error("{location}: invalid range '{text}'")]
    RangeSyntax { location: FieldLocation, text: String },

    /// Raised when a range lies outside the worksheet grid.
    #[error("{location}: range '{range}' lies outside the worksheet")]
    RangeOutOfBounds {
        location: FieldLocation,
        range: String,
    },

    /// Raised when a range's dimensions do not fit the Value range.
    #[error("{location}: {detail}")]
    ShapeMismatch {
        location: FieldLocation,
        detail: String,
    },

    /// Raised when the number of multi-column axes of a source is wrong.
    #[error(
        "source {position}: found {found} multi-column axes among Entity, Department and Date; expected {expected}"
    )]
    MultiColumnConflict {
        position: usize,
        found: usize,
        expected: usize,
    },

    /// Raised when a run is requested while another one is in progress.
    #[error("a consolidation run is already in progress")]
    RunInProgress,

    /// Raised when a configuration document carries a newer version tag.
    #[error("unsupported configuration version {found} (latest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ConsolidateError {
    pub(crate) fn run_config(message: impl Into<String>) -> Self {
        ConsolidateError::Configuration {
            scope: Scope::Run,
            message: message.into(),
        }
    }

    pub(crate) fn source_config(position: usize, message: impl Into<String>) -> Self {
        ConsolidateError::Configuration {
            scope: Scope::Source(position),
            message: message.into(),
        }
    }
}

/// What a configuration error refers to: the run as a whole or one source,
/// identified by its 1-based position in the configured list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Run,
    Source(usize),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Run => write!(f, "configuration"),
            Scope::Source(position) => write!(f, "source {position}"),
        }
    }
}
