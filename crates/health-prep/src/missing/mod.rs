//! Missing-value detection.
//!
//! A [`Dataset`] bundles the two per-survey capabilities the pipeline needs:
//! the heuristic that classifies each raw cell as present, not applicable or
//! not available, and the list of columns to discard before processing.
//! [`MissingValueDetector`] applies the heuristic column by column and
//! assembles a code table shaped exactly like its input.

mod heuristics;

pub use heuristics::{DatasetKind, MarkerDataset, NullDataset};

use crate::error::{PrepError, Result};
use crate::types::MissingValueCode;
use crate::utils::code_series;
use polars::prelude::*;
use tracing::{debug, warn};

/// Per-survey capabilities: missing-value heuristic and drop list.
pub trait Dataset: Send + Sync {
    /// Classify each cell of `column`.
    ///
    /// The result must have one code per cell, in row order.
    fn heuristic(&self, column: &Series) -> Result<Vec<MissingValueCode>>;

    /// Columns to remove from `table` before any other processing.
    fn to_drop(&self, table: &str) -> Option<Vec<String>>;
}

/// Result of running a heuristic over a whole table.
#[derive(Debug, Clone)]
pub struct Detection {
    /// `UInt8` code table with the input's column names and height.
    pub missing_values: DataFrame,
    /// Columns whose heuristic failed, with the diagnostic.
    pub skipped: Vec<(String, String)>,
}

impl Detection {
    pub fn skipped_columns(&self) -> Vec<String> {
        self.skipped.iter().map(|(c, _)| c.clone()).collect()
    }
}

/// Applies a dataset heuristic to every column of a table.
pub struct MissingValueDetector;

impl MissingValueDetector {
    /// Build the missing-value code table of `table`.
    ///
    /// A column whose heuristic errors or returns the wrong number of codes
    /// is reported in [`Detection::skipped`] and gets NOT_MISSING codes, so
    /// the code table always has the same shape as `table`.
    pub fn detect(table: &DataFrame, dataset: &dyn Dataset) -> Result<Detection> {
        let height = table.height();
        let mut columns = Vec::with_capacity(table.width());
        let mut skipped = Vec::new();

        for column in table.get_columns() {
            let name = column.name().as_str();
            let series = column.as_materialized_series();

            let codes = match Self::apply(series, dataset) {
                Ok(codes) => {
                    let n_missing = codes.iter().filter(|c| **c != 0).count();
                    debug!("{}: {} missing cells", name, n_missing);
                    codes
                }
                Err(e) => {
                    warn!("{}. Column kept with no missing values.", e);
                    skipped.push((name.to_string(), e.to_string()));
                    vec![MissingValueCode::NotMissing.code(); height]
                }
            };

            columns.push(code_series(name, codes).into_column());
        }

        Ok(Detection {
            missing_values: DataFrame::new(columns)?,
            skipped,
        })
    }

    fn apply(series: &Series, dataset: &dyn Dataset) -> Result<Vec<u8>> {
        let codes = dataset.heuristic(series).map_err(|e| match e {
            PrepError::HeuristicFailed { .. } => e,
            other => PrepError::HeuristicFailed {
                column: series.name().to_string(),
                reason: other.to_string(),
            },
        })?;

        if codes.len() != series.len() {
            return Err(PrepError::HeuristicFailed {
                column: series.name().to_string(),
                reason: format!(
                    "returned {} codes for {} rows",
                    codes.len(),
                    series.len()
                ),
            });
        }

        Ok(codes.into_iter().map(MissingValueCode::code).collect())
    }
}
