use crate::error::PrepError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Feature types
// ============================================================================

/// Statistical role of a column.
///
/// The declaration order is the default group order used when partitioned
/// tables are merged back together.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Unordered categories, one-hot encoded.
    Categorical,
    /// Ordered categories, encoded as integer ranks.
    Ordinal,
    /// Two-valued categories, encoded as 0/1.
    Binary,
    /// Real-valued measurement.
    ContinuousReal,
    /// Integer-valued measurement (counts, ages...).
    ContinuousInteger,
    /// Date collapsed into a single numeric timestamp.
    DateTimestamp,
    /// Date exploded into year/month/day columns.
    DateExploded,
    /// Identifiers, free text and anything else not fed to a model.
    NotAFeature,
}

impl FeatureType {
    /// All feature types, in default merge order.
    pub const ALL: [FeatureType; 8] = [
        Self::Categorical,
        Self::Ordinal,
        Self::Binary,
        Self::ContinuousReal,
        Self::ContinuousInteger,
        Self::DateTimestamp,
        Self::DateExploded,
        Self::NotAFeature,
    ];

    /// Label used in metadata files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Ordinal => "ordinal",
            Self::Binary => "binary",
            Self::ContinuousReal => "continuous_real",
            Self::ContinuousInteger => "continuous_integer",
            Self::DateTimestamp => "date_timestamp",
            Self::DateExploded => "date_exploded",
            Self::NotAFeature => "not_a_feature",
        }
    }

    /// Whether values of this type are coerced to `Float64` after encoding.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::ContinuousReal | Self::ContinuousInteger)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "categorical" => Ok(Self::Categorical),
            "ordinal" => Ok(Self::Ordinal),
            "binary" => Ok(Self::Binary),
            "continuous_real" | "continue_r" => Ok(Self::ContinuousReal),
            "continuous_integer" | "continue_i" => Ok(Self::ContinuousInteger),
            "date_timestamp" => Ok(Self::DateTimestamp),
            "date_exploded" => Ok(Self::DateExploded),
            "not_a_feature" => Ok(Self::NotAFeature),
            other => Err(PrepError::UnknownFeatureType(other.to_string())),
        }
    }
}

// ============================================================================
// Missing-value codes
// ============================================================================

/// Per-cell missingness tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MissingValueCode {
    NotMissing = 0,
    /// The question did not apply to this respondent.
    NotApplicable = 1,
    /// The answer exists in principle but was not collected.
    NotAvailable = 2,
}

impl MissingValueCode {
    /// Integer representation stored in missing-value tables.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotMissing),
            1 => Some(Self::NotApplicable),
            2 => Some(Self::NotAvailable),
            _ => None,
        }
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        self != Self::NotMissing
    }
}

/// Integer code of a present value.
pub const NOT_MISSING: u8 = MissingValueCode::NotMissing as u8;

// ============================================================================
// Column -> feature type mapping
// ============================================================================

/// Ordered mapping from column name to [`FeatureType`].
///
/// Entry order follows column order of the table it describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTypes {
    entries: Vec<(String, FeatureType)>,
}

impl FeatureTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, FeatureType)>,
        S: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, name: impl Into<String>, feature_type: FeatureType) {
        self.entries.push((name.into(), feature_type));
    }

    pub fn extend(&mut self, other: FeatureTypes) {
        self.entries.extend(other.entries);
    }

    /// Type of a column, if present.
    pub fn get(&self, name: &str) -> Option<FeatureType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureType)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of entries per feature type.
    pub fn counts(&self) -> BTreeMap<FeatureType, usize> {
        let mut counts = BTreeMap::new();
        for (_, t) in &self.entries {
            *counts.entry(*t).or_insert(0) += 1;
        }
        counts
    }

    /// Remove the given columns, returning how many entries were removed.
    pub fn drop_columns(&mut self, names: &[String]) -> usize {
        let to_drop: HashSet<&str> = names.iter().map(String::as_str).collect();
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !to_drop.contains(n.as_str()));
        before - self.entries.len()
    }

    /// Whether the entries name exactly the columns of `df`, once each.
    pub fn matches_columns(&self, df: &DataFrame) -> bool {
        let names: HashSet<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        if self.entries.len() != df.width() || names.len() != self.entries.len() {
            return false;
        }
        df.get_column_names()
            .iter()
            .all(|c| names.contains(c.as_str()))
    }
}

// ============================================================================
// Ordinal orders
// ============================================================================

/// Explicit category ranking per ordinal column of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrdinalOrder {
    columns: BTreeMap<String, Vec<String>>,
}

impl OrdinalOrder {
    pub fn new(columns: BTreeMap<String, Vec<String>>) -> Self {
        Self { columns }
    }

    /// Ordered labels for a column, lowest rank first.
    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// Encoded output
// ============================================================================

/// Output of the encoding pipeline: values, codes and types, column-aligned.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    pub values: DataFrame,
    pub missing_values: DataFrame,
    pub feature_types: FeatureTypes,
}

impl EncodedTable {
    /// Shape of the encoded value table.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.values
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}

// ============================================================================
// Per-table lifecycle and load reporting
// ============================================================================

/// Lifecycle of a table inside a [`Database`](crate::Database).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStage {
    Unloaded,
    RawLoaded,
    TypesLoaded,
    Dropped,
    MissingDetected,
    Encoded,
}

impl TableStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unloaded => "Unloaded",
            Self::RawLoaded => "Raw Loaded",
            Self::TypesLoaded => "Types Loaded",
            Self::Dropped => "Columns Dropped",
            Self::MissingDetected => "Missing Values Detected",
            Self::Encoded => "Encoded",
        }
    }
}

/// A recoverable problem met while loading one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableIssue {
    pub code: String,
    pub message: String,
}

impl From<&PrepError> for TableIssue {
    fn from(err: &PrepError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// What happened to one table during a `load` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    pub name: String,
    /// Stage reached at the end of the call.
    pub stage: TableStage,
    pub rows: usize,
    pub columns: usize,
    /// Columns removed by the dataset's drop list.
    pub dropped_columns: Vec<String>,
    /// Columns whose missing-value heuristic failed.
    pub skipped_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_shape: Option<(usize, usize)>,
    pub issues: Vec<TableIssue>,
}

impl TableOutcome {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: TableStage::Unloaded,
            rows: 0,
            columns: 0,
            dropped_columns: Vec::new(),
            skipped_columns: Vec::new(),
            encoded_shape: None,
            issues: Vec::new(),
        }
    }

    pub fn add_issue(&mut self, err: &PrepError) {
        self.issues.push(TableIssue::from(err));
    }

    pub fn is_encoded(&self) -> bool {
        self.stage == TableStage::Encoded
    }
}

/// Summary of a `load` call, one outcome per requested table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub tables: Vec<TableOutcome>,
}

impl LoadReport {
    pub fn get(&self, name: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn encoded_count(&self) -> usize {
        self.tables.iter().filter(|t| t.is_encoded()).count()
    }

    /// Whether every requested table reached the encoded stage.
    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(TableOutcome::is_encoded)
    }
}

// ============================================================================
// Tests
// ============================================================================
