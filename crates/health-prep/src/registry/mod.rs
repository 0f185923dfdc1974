//! Feature-type metadata lookup.
//!
//! This module provides:
//! - The [`FeatureTypeSource`] capability that produces a column → type
//!   mapping for a table
//! - A CSV-backed source reading `types/{acronym}/{table}.csv`
//! - The [`FeatureTypeRegistry`] that checks a mapping against its table
//! - Loading of optional ordinal-order files

mod order;

pub use order::load_ordinal_order;

use crate::error::{PrepError, Result, ResultExt};
use crate::types::{FeatureType, FeatureTypes};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Produces the feature types of a table from external metadata.
pub trait FeatureTypeSource: Send + Sync {
    /// Load the column → type mapping of `table` in database `acronym`.
    fn load(&self, acronym: &str, table: &str) -> Result<FeatureTypes>;
}

/// Reads feature types from `{root}/types/{acronym}/{table}.csv`.
///
/// The file has a header row and two columns: column name, type label.
#[derive(Debug, Clone)]
pub struct CsvFeatureTypeSource {
    root: PathBuf,
}

impl CsvFeatureTypeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the type file of a table.
    pub fn path_for(&self, acronym: &str, table: &str) -> PathBuf {
        self.root
            .join("types")
            .join(acronym)
            .join(format!("{}.csv", table))
    }
}

impl FeatureTypeSource for CsvFeatureTypeSource {
    fn load(&self, acronym: &str, table: &str) -> Result<FeatureTypes> {
        let path = self.path_for(acronym, table);
        debug!("Reading feature types from {}", path.display());
        read_type_file(&path)
    }
}

fn read_type_file(path: &Path) -> Result<FeatureTypes> {
    if !path.exists() {
        return Err(PrepError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("feature type file not found: {}", path.display()),
        )));
    }

    // Schema inference disabled: every column is read as a string.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Reading {}", path.display()))?
        .finish()
        .context(format!("Reading {}", path.display()))?;

    let columns = df.get_columns();
    if columns.len() < 2 {
        return Err(PrepError::InvalidConfig(format!(
            "{}: expected two columns (name, type), found {}",
            path.display(),
            columns.len()
        )));
    }

    let names = columns[0].as_materialized_series().str()?;
    let labels = columns[1].as_materialized_series().str()?;

    let mut types = FeatureTypes::new();
    for (name, label) in names.into_iter().zip(labels.into_iter()) {
        let (Some(name), Some(label)) = (name, label) else {
            continue;
        };
        types.push(name.trim(), label.parse::<FeatureType>()?);
    }
    Ok(types)
}

/// Looks up and validates feature types for the tables of one database.
pub struct FeatureTypeRegistry<'a> {
    source: &'a dyn FeatureTypeSource,
    acronym: &'a str,
}

impl<'a> FeatureTypeRegistry<'a> {
    pub fn new(source: &'a dyn FeatureTypeSource, acronym: &'a str) -> Self {
        Self { source, acronym }
    }

    /// Load the feature types of `table_name` and check them against `table`.
    ///
    /// Returns [`PrepError::TypeMismatch`] when the number of types differs
    /// from the number of columns or when they name different columns. The
    /// returned mapping follows the table's column order.
    pub fn load(&self, table_name: &str, table: &DataFrame) -> Result<FeatureTypes> {
        let types = self.source.load(self.acronym, table_name)?;

        if !types.matches_columns(table) {
            return Err(PrepError::TypeMismatch {
                table: table_name.to_string(),
                types: types.len(),
                columns: table.width(),
            });
        }

        Ok(align_to_table(&types, table))
    }
}

/// Reorder a mapping to follow the column order of `table`.
///
/// Columns without an entry are skipped.
pub fn align_to_table(types: &FeatureTypes, table: &DataFrame) -> FeatureTypes {
    FeatureTypes::from_pairs(table.get_column_names().iter().filter_map(|c| {
        types
            .get(c.as_str())
            .map(|t| (c.to_string(), t))
    }))
}
