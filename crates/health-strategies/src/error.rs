//! Error types for the health-strategies crate.
//!
//! This module defines [`StrategyError`], the error type returned when
//! strategy parameters are read or validated, or when a strategy is looked
//! up by name.

use thiserror::Error;

/// The main error type for strategy configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StrategyError {
    /// Invalid parameter value.
    ///
    /// Check the message for the offending parameter and accepted values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No strategy with this name exists in the table.
    #[error("Unknown strategy '{name}'. Available strategies: {available:?}")]
    UnknownStrategy {
        /// The requested name.
        name: String,
        /// Names present in the table.
        available: Vec<String>,
    },

    /// I/O error while reading a parameter file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The parameter file is not valid YAML for [`StrategyParams`](crate::StrategyParams).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A strategy could not be written as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;
