//! Shared helpers for working with value and missing-value tables.

use crate::error::{PrepError, Result};
use crate::types::NOT_MISSING;
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Series Conversion Utilities
// =============================================================================

/// Column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

/// Fail with [`PrepError::DuplicateColumn`] on the first repeated column name.
pub fn ensure_unique_names(columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.name().as_str()) {
            return Err(PrepError::DuplicateColumn(column.name().to_string()));
        }
    }
    Ok(())
}

/// Render every cell of a Series as an optional string.
///
/// Nulls stay `None`; everything else goes through a string cast so that
/// numeric categories ("1", "2.5") compare against labels from metadata files.
pub fn series_to_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Boolean mask of cells whose missing-value code is not NOT_MISSING.
///
/// A null code counts as missing.
pub fn missing_mask(codes: &Series) -> PolarsResult<Vec<bool>> {
    let codes = codes.cast(&DataType::UInt8)?;
    Ok(codes
        .u8()?
        .into_iter()
        .map(|c| c.is_none_or(|c| c != NOT_MISSING))
        .collect())
}

/// Missing-value code column with the given values.
pub fn code_series(name: &str, codes: Vec<u8>) -> Series {
    Series::new(name.into(), codes)
}

/// Copy of a code column under a new name.
pub fn renamed(series: &Series, name: &str) -> Series {
    let mut out = series.clone();
    out.rename(name.into());
    out
}

// =============================================================================
// Marker Utilities
// =============================================================================

/// Default markers for answers that exist but were not collected.
pub const NOT_AVAILABLE_MARKERS: [&str; 8] = [
    "refused",
    "don't know",
    "not ascertained",
    "unknown",
    "n/a",
    "na",
    "missing",
    "#n/a",
];

/// Default markers for questions that did not apply to the respondent.
pub const NOT_APPLICABLE_MARKERS: [&str; 2] = ["not applicable", "inapplicable"];

/// Case-insensitive, whitespace-trimmed membership test.
pub fn matches_marker<S: AsRef<str>>(value: &str, markers: &[S]) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    markers
        .iter()
        .any(|m| m.as_ref().trim().eq_ignore_ascii_case(&lower))
}

// =============================================================================
// Tests
// =============================================================================
