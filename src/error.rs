//! Error types shared by the sniffer, encoder, synthesizer and orchestrator.

use thiserror::Error;

use crate::sniff::ColumnKind;

/// Recognised explicit datatype tokens, in the order they are reported.
pub const KNOWN_DATATYPES: &[&str] = &[
    "int4", "float8", "str", "int", "integer", "float", "double", "text", "bigint", "int8",
    "smallint", "short",
];

/// Failure to turn a single cell into a COPY token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("cannot encode {value:?} as {expected}")]
    TypeMismatch { value: String, expected: ColumnKind },

    #[error("value {value:?} opens a quote it never closes")]
    MalformedQuotedValue { value: String },
}

/// Main error type for conversion runs.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Empty, unmangleable, or colliding identifier
    #[error("Invalid identifier {raw:?}: {reason}")]
    Identifier { raw: String, reason: String },

    /// Explicit datatype outside the recognised set
    #[error("Unknown datatype '{0}' (use one of: {known})", known = KNOWN_DATATYPES.join(", "))]
    UnknownTypeOverride(String),

    /// A cell failed to encode; carries the 1-based data row and raw column name
    #[error("Row {row} column '{column}': {source}")]
    Row {
        row: usize,
        column: String,
        #[source]
        source: ValueError,
    },

    /// Input without a header row, so there are no columns to create
    #[error("{input} has no header row")]
    EmptyHeader { input: String },

    /// Malformed option or configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode input with encoding {encoding}")]
    Decode { encoding: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn identifier(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ConvertError::Identifier {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn row(row: usize, column: impl Into<String>, source: ValueError) -> Self {
        ConvertError::Row {
            row,
            column: column.into(),
            source,
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            ConvertError::Row {
                source: ValueError::TypeMismatch { .. },
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
