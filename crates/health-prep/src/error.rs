//! Error types for loading and encoding survey tables.
//!
//! Errors fall in two families. Structural errors (bad arguments, unknown
//! table names, unreadable CSV files) abort the whole `load` call. Per-table
//! data-quality errors are recoverable: the orchestrator logs them, records
//! them in the load report and moves on to the next table.
//!
//! Errors are serializable so they can be emitted as part of a JSON report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the encoding pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Invalid argument or configuration (e.g. an empty table-name list).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Requested table has no existing backing file.
    #[error("'{name}' is not an available table name. Available tables: {available:?}")]
    UnavailableTable { name: String, available: Vec<String> },

    /// Feature-type metadata does not describe the table's columns.
    #[error("{table}: {types} feature types loaded for {columns} columns")]
    TypeMismatch {
        table: String,
        types: usize,
        columns: usize,
    },

    /// A companion structure is absent when the table is encoded.
    #[error("{table}: {companion} missing, encoding ignored")]
    MissingCompanion {
        table: String,
        companion: &'static str,
    },

    /// Ordinal order file could not be used.
    #[error("{table}: unusable ordinal order file: {reason}")]
    OrderFile { table: String, reason: String },

    /// A feature-type label outside the known taxonomy.
    #[error("Unknown feature type '{0}'")]
    UnknownFeatureType(String),

    /// The missing-value heuristic failed on a column.
    #[error("Missing-value heuristic failed on column '{column}': {reason}")]
    HeuristicFailed { column: String, reason: String },

    /// A cell could not be read as a date.
    #[error("Cannot parse '{value}' as a date in column '{column}'")]
    DateParse { column: String, value: String },

    /// An encoder produced a column name that is already taken.
    #[error("Encoded column '{0}' collides with another column")]
    DuplicateColumn(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for report consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnavailableTable { .. } => "UNAVAILABLE_TABLE",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MissingCompanion { .. } => "MISSING_COMPANION",
            Self::OrderFile { .. } => "ORDER_FILE",
            Self::UnknownFeatureType(_) => "UNKNOWN_FEATURE_TYPE",
            Self::HeuristicFailed { .. } => "HEURISTIC_FAILED",
            Self::DateParse { .. } => "DATE_PARSE",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error only affects a single table or column.
    ///
    /// Recoverable errors degrade one table to a partial result; the
    /// remaining tables of a batch are still processed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TypeMismatch { .. }
            | Self::MissingCompanion { .. }
            | Self::OrderFile { .. }
            | Self::UnknownFeatureType(_)
            | Self::HeuristicFailed { .. }
            | Self::DuplicateColumn(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}
