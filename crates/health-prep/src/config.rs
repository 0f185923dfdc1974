//! Configuration types for a survey database.
//!
//! This module provides the [`DatabaseConfig`] with a builder, and the
//! [`EncodeFilter`] that selects which encoding stages run.

use crate::error::{PrepError, Result};
use crate::missing::DatasetKind;
use crate::types::FeatureType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Placeholder written into missing cells before categorical encoders run.
///
/// The leading "z " sorts it after any real label.
pub const DEFAULT_PLACEHOLDER: &str = "z MISSING_VALUE";

/// Encoding stage that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStage {
    /// Ordinal and binary columns to integer ranks.
    Ordinal,
    /// Categorical columns to indicator columns.
    OneHot,
    /// Date columns to timestamps or year/month/day.
    Date,
}

impl EncodingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinal => "ordinal",
            Self::OneHot => "one_hot",
            Self::Date => "date",
        }
    }
}

/// Which encoding stages run. Defaults to all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeFilter {
    pub ordinal: bool,
    pub one_hot: bool,
    pub date: bool,
}

impl Default for EncodeFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl EncodeFilter {
    pub fn all() -> Self {
        Self {
            ordinal: true,
            one_hot: true,
            date: true,
        }
    }

    pub fn none() -> Self {
        Self {
            ordinal: false,
            one_hot: false,
            date: false,
        }
    }

    /// Enable only the given stages.
    pub fn only(stages: &[EncodingStage]) -> Self {
        let mut filter = Self::none();
        for stage in stages {
            match stage {
                EncodingStage::Ordinal => filter.ordinal = true,
                EncodingStage::OneHot => filter.one_hot = true,
                EncodingStage::Date => filter.date = true,
            }
        }
        filter
    }

    pub fn enables(&self, stage: EncodingStage) -> bool {
        match stage {
            EncodingStage::Ordinal => self.ordinal,
            EncodingStage::OneHot => self.one_hot,
            EncodingStage::Date => self.date,
        }
    }
}

impl fmt::Display for EncodeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::all() {
            return f.write_str("all");
        }
        let names: Vec<&str> = [EncodingStage::Ordinal, EncodingStage::OneHot, EncodingStage::Date]
            .into_iter()
            .filter(|s| self.enables(*s))
            .map(|s| s.as_str())
            .collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for EncodeFilter {
    type Err = PrepError;

    /// Parse `"all"` or a comma-separated list of `ordinal`, `one_hot`, `date`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut stages = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "all" => return Ok(Self::all()),
                "ordinal" => stages.push(EncodingStage::Ordinal),
                "one_hot" | "onehot" => stages.push(EncodingStage::OneHot),
                "date" => stages.push(EncodingStage::Date),
                other => {
                    return Err(PrepError::InvalidConfig(format!(
                        "unknown encoding stage '{}'",
                        other
                    )));
                }
            }
        }
        Ok(Self::only(&stages))
    }
}

/// Configuration of a survey database.
///
/// Use [`DatabaseConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use health_prep::config::DatabaseConfig;
///
/// let config = DatabaseConfig::builder()
///     .name("National Health Interview Survey")
///     .acronym("NHIS")
///     .path("adults", "data/adults.csv")
///     .metadata_dir("metadata")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Human-readable database name.
    pub name: String,

    /// Short identifier used to locate metadata files.
    pub acronym: String,

    /// Table name to CSV file path.
    pub paths: BTreeMap<String, PathBuf>,

    /// CSV field separator.
    /// Default: ','
    pub separator: char,

    /// Root of the `types/` and `ordinal_orders/` metadata trees.
    /// Default: "metadata"
    pub metadata_dir: PathBuf,

    /// Encoding stages to run.
    /// Default: all
    pub encode: EncodeFilter,

    /// Group order used when merging encoded groups back together.
    /// Default: feature-type declaration order
    pub group_order: Vec<FeatureType>,

    /// Placeholder substituted into missing cells before encoding.
    /// Default: "z MISSING_VALUE"
    pub placeholder: String,

    /// Missing-value heuristic variant.
    /// Default: Marker
    pub dataset: DatasetKind,

    /// Columns to remove per table before any other processing.
    pub drop: BTreeMap<String, Vec<String>>,

    /// Raw values meaning "question did not apply".
    pub not_applicable_markers: Vec<String>,

    /// Raw values meaning "answer was not collected".
    pub not_available_markers: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            acronym: String::new(),
            paths: BTreeMap::new(),
            separator: ',',
            metadata_dir: PathBuf::from("metadata"),
            encode: EncodeFilter::all(),
            group_order: FeatureType::ALL.to_vec(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            dataset: DatasetKind::default(),
            drop: BTreeMap::new(),
            not_applicable_markers: crate::utils::NOT_APPLICABLE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            not_available_markers: crate::utils::NOT_AVAILABLE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    /// Read a configuration from a JSON file and validate it.
    ///
    /// Relative table paths and metadata directory are resolved against the
    /// directory containing the file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config: DatabaseConfig = serde_json::from_str(&text)?;

        if let Some(base) = path.parent() {
            for p in config.paths.values_mut() {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
            if config.metadata_dir.is_relative() {
                config.metadata_dir = base.join(&config.metadata_dir);
            }
        }

        config
            .validate()
            .map_err(|e| PrepError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Separator as the single byte expected by the CSV reader.
    pub fn separator_byte(&self) -> u8 {
        self.separator as u8
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.acronym.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("acronym".to_string()));
        }

        if !self.separator.is_ascii() || self.separator == '\n' || self.separator == '"' {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if self.placeholder.is_empty() {
            return Err(ConfigValidationError::EmptyField("placeholder".to_string()));
        }

        let mut seen = HashSet::new();
        for t in &self.group_order {
            if !seen.insert(*t) {
                return Err(ConfigValidationError::DuplicateGroup(*t));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Invalid CSV separator {0:?} (must be a single ASCII character)")]
    InvalidSeparator(char),

    #[error("Feature type '{0}' appears more than once in the group order")]
    DuplicateGroup(FeatureType),
}

/// Builder for [`DatabaseConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    name: Option<String>,
    acronym: Option<String>,
    paths: BTreeMap<String, PathBuf>,
    separator: Option<char>,
    metadata_dir: Option<PathBuf>,
    encode: Option<EncodeFilter>,
    group_order: Option<Vec<FeatureType>>,
    placeholder: Option<String>,
    dataset: Option<DatasetKind>,
    drop: BTreeMap<String, Vec<String>>,
    not_applicable_markers: Option<Vec<String>>,
    not_available_markers: Option<Vec<String>>,
}

impl DatabaseConfigBuilder {
    /// Set the human-readable database name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the acronym used to locate metadata files.
    pub fn acronym(mut self, acronym: impl Into<String>) -> Self {
        self.acronym = Some(acronym.into());
        self
    }

    /// Register the CSV file backing a table.
    pub fn path(mut self, table: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(table.into(), path.into());
        self
    }

    /// Set the CSV field separator.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the metadata root directory.
    pub fn metadata_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_dir = Some(path.into());
        self
    }

    /// Select which encoding stages run.
    pub fn encode(mut self, filter: EncodeFilter) -> Self {
        self.encode = Some(filter);
        self
    }

    /// Set the group order used when merging encoded groups.
    ///
    /// Groups whose type is not listed are appended after the listed ones.
    pub fn group_order(mut self, order: Vec<FeatureType>) -> Self {
        self.group_order = Some(order);
        self
    }

    /// Set the placeholder written into missing cells before encoding.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Select the missing-value heuristic variant.
    pub fn dataset(mut self, kind: DatasetKind) -> Self {
        self.dataset = Some(kind);
        self
    }

    /// Columns to remove from a table before any other processing.
    pub fn drop_columns<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the default "not applicable" markers.
    pub fn not_applicable_markers(mut self, markers: Vec<String>) -> Self {
        self.not_applicable_markers = Some(markers);
        self
    }

    /// Replace the default "not available" markers.
    pub fn not_available_markers(mut self, markers: Vec<String>) -> Self {
        self.not_available_markers = Some(markers);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DatabaseConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<DatabaseConfig, ConfigValidationError> {
        let defaults = DatabaseConfig::default();
        let config = DatabaseConfig {
            name: self.name.unwrap_or_default(),
            acronym: self.acronym.unwrap_or_default(),
            paths: self.paths,
            separator: self.separator.unwrap_or(defaults.separator),
            metadata_dir: self.metadata_dir.unwrap_or(defaults.metadata_dir),
            encode: self.encode.unwrap_or_default(),
            group_order: self.group_order.unwrap_or(defaults.group_order),
            placeholder: self.placeholder.unwrap_or(defaults.placeholder),
            dataset: self.dataset.unwrap_or_default(),
            drop: self.drop,
            not_applicable_markers: self
                .not_applicable_markers
                .unwrap_or(defaults.not_applicable_markers),
            not_available_markers: self
                .not_available_markers
                .unwrap_or(defaults.not_available_markers),
        };

        config.validate()?;
        Ok(config)
    }
}
