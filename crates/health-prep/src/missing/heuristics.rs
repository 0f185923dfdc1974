//! Built-in dataset variants.

use super::Dataset;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::types::MissingValueCode;
use crate::utils::{matches_marker, series_to_strings};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dataset variant selected when a database is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Nulls and configured marker values are missing.
    #[default]
    Marker,
    /// Only nulls are missing (all of them "not available").
    Null,
}

impl DatasetKind {
    /// Build the dataset implementation described by `config`.
    pub fn build(self, config: &DatabaseConfig) -> Box<dyn Dataset> {
        match self {
            Self::Marker => Box::new(MarkerDataset::from_config(config)),
            Self::Null => Box::new(NullDataset::new(config.drop.clone())),
        }
    }
}

/// Classifies cells by comparing them against survey answer markers.
///
/// Nulls are NOT_AVAILABLE. Cells equal (case-insensitively) to one of the
/// "not applicable" markers are NOT_APPLICABLE, cells equal to one of the
/// "not available" markers are NOT_AVAILABLE.
#[derive(Debug, Clone, Default)]
pub struct MarkerDataset {
    not_applicable: Vec<String>,
    not_available: Vec<String>,
    drop: BTreeMap<String, Vec<String>>,
}

impl MarkerDataset {
    pub fn new(
        not_applicable: Vec<String>,
        not_available: Vec<String>,
        drop: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            not_applicable,
            not_available,
            drop,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.not_applicable_markers.clone(),
            config.not_available_markers.clone(),
            config.drop.clone(),
        )
    }

    fn classify(&self, value: Option<&str>) -> MissingValueCode {
        match value {
            None => MissingValueCode::NotAvailable,
            Some(v) if matches_marker(v, &self.not_applicable) => MissingValueCode::NotApplicable,
            Some(v) if matches_marker(v, &self.not_available) => MissingValueCode::NotAvailable,
            Some(_) => MissingValueCode::NotMissing,
        }
    }
}

impl Dataset for MarkerDataset {
    fn heuristic(&self, column: &Series) -> Result<Vec<MissingValueCode>> {
        let values = series_to_strings(column)?;
        Ok(values.iter().map(|v| self.classify(v.as_deref())).collect())
    }

    fn to_drop(&self, table: &str) -> Option<Vec<String>> {
        self.drop.get(table).cloned()
    }
}

/// Treats nulls as NOT_AVAILABLE and everything else as present.
#[derive(Debug, Clone, Default)]
pub struct NullDataset {
    drop: BTreeMap<String, Vec<String>>,
}

impl NullDataset {
    pub fn new(drop: BTreeMap<String, Vec<String>>) -> Self {
        Self { drop }
    }
}

impl Dataset for NullDataset {
    fn heuristic(&self, column: &Series) -> Result<Vec<MissingValueCode>> {
        let nulls = column.is_null();
        Ok(nulls
            .into_iter()
            .map(|null| match null {
                Some(false) => MissingValueCode::NotMissing,
                _ => MissingValueCode::NotAvailable,
            })
            .collect())
    }

    fn to_drop(&self, table: &str) -> Option<Vec<String>> {
        self.drop.get(table).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> MarkerDataset {
        MarkerDataset::new(
            vec!["Not applicable".to_string()],
            vec!["Refused".to_string(), "99".to_string()],
            BTreeMap::from([("adults".to_string(), vec!["id".to_string()])]),
        )
    }

    #[test]
    fn test_marker_heuristic_strings() {
        let series = Series::new(
            "smoker".into(),
            &[Some("yes"), Some("not applicable"), Some("REFUSED"), None],
        );
        let codes = markers().heuristic(&series).unwrap();
        assert_eq!(
            codes,
            vec![
                MissingValueCode::NotMissing,
                MissingValueCode::NotApplicable,
                MissingValueCode::NotAvailable,
                MissingValueCode::NotAvailable,
            ]
        );
    }

    #[test]
    fn test_marker_heuristic_numeric_codes() {
        let series = Series::new("age".into(), &[Some(34i64), Some(99), None]);
        let codes = markers().heuristic(&series).unwrap();
        assert_eq!(
            codes,
            vec![
                MissingValueCode::NotMissing,
                MissingValueCode::NotAvailable,
                MissingValueCode::NotAvailable,
            ]
        );
    }

    #[test]
    fn test_drop_lists() {
        let dataset = markers();
        assert_eq!(dataset.to_drop("adults"), Some(vec!["id".to_string()]));
        assert_eq!(dataset.to_drop("children"), None);
    }

    #[test]
    fn test_null_dataset() {
        let series = Series::new("x".into(), &[Some("Refused"), None]);
        let codes = NullDataset::default().heuristic(&series).unwrap();
        assert_eq!(
            codes,
            vec![MissingValueCode::NotMissing, MissingValueCode::NotAvailable]
        );
    }

    #[test]
    fn test_kind_builds_from_config() {
        let config = DatabaseConfig::builder()
            .acronym("TS")
            .drop_columns("adults", ["id"])
            .build()
            .unwrap();
        let dataset = DatasetKind::Null.build(&config);
        assert_eq!(dataset.to_drop("adults"), Some(vec!["id".to_string()]));
    }
}
