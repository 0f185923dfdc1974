//! The encoding pipeline: from raw values and codes to model-ready columns.

use super::dates::DateEncoder;
use super::fill::{post_fill, pre_fill};
use super::one_hot::OneHotEncoder;
use super::ordinal::OrdinalEncoder;
use crate::config::{DEFAULT_PLACEHOLDER, DatabaseConfig, EncodeFilter};
use crate::error::Result;
use crate::partition::PartitionedTable;
use crate::types::{EncodedTable, FeatureType, FeatureTypes, OrdinalOrder};
use polars::prelude::*;
use tracing::debug;

/// Settings of one encoding run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Stages to run.
    pub filter: EncodeFilter,
    /// Order in which type groups are merged back.
    pub group_order: Vec<FeatureType>,
    /// Value written into missing cells before categorical encoding.
    pub placeholder: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            filter: EncodeFilter::all(),
            group_order: FeatureType::ALL.to_vec(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl EncodeOptions {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            filter: config.encode,
            group_order: config.group_order.clone(),
            placeholder: config.placeholder.clone(),
        }
    }

    pub fn with_filter(mut self, filter: EncodeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Encodes one table.
pub struct EncodingPipeline;

impl EncodingPipeline {
    /// Encode `values` given its missing-value codes and feature types.
    ///
    /// NOT_A_FEATURE columns are removed. Groups whose stage is disabled or
    /// that no stage handles are carried through unchanged (apart from the
    /// null fill) and merged back. Continuous columns come out as `Float64`.
    pub fn encode(
        values: &DataFrame,
        missing: &DataFrame,
        types: &FeatureTypes,
        order: Option<&OrdinalOrder>,
        options: &EncodeOptions,
    ) -> Result<EncodedTable> {
        let placeholder = options.placeholder.as_str();
        let filter = &options.filter;
        let mut table = PartitionedTable::split(values, missing, types)?;

        if let Some(dropped) = table.remove(FeatureType::NotAFeature) {
            debug!("Dropped {} non-feature columns", dropped.values.width());
        }

        for (key, group) in table.groups_mut() {
            let filled = pre_fill(group, placeholder)?;
            debug!("{}: {} placeholder cells", key, filled);
        }

        if filter.ordinal {
            for key in [FeatureType::Ordinal, FeatureType::Binary] {
                if let Some(group) = table.get_mut(key) {
                    OrdinalEncoder::encode(group, order, placeholder, key == FeatureType::Binary)?;
                }
            }
        }

        if filter.one_hot {
            if let Some(group) = table.get_mut(FeatureType::Categorical) {
                OneHotEncoder::encode(group, placeholder)?;
            }
        }

        for (key, group) in table.groups_mut() {
            let cleared = post_fill(group)?;
            debug!("{}: {} cells set to null", key, cleared);
        }

        if filter.date {
            if let Some(group) = table.get_mut(FeatureType::DateExploded) {
                DateEncoder::explode(group)?;
            }
            if let Some(group) = table.get_mut(FeatureType::DateTimestamp) {
                DateEncoder::timestamp(group)?;
            }
        }

        let (values, missing_values, feature_types) = table.merge(&options.group_order)?;
        let values = coerce_continuous(values, &feature_types)?;

        Ok(EncodedTable {
            values,
            missing_values,
            feature_types,
        })
    }
}

/// Cast CONTINUOUS_REAL and CONTINUOUS_INTEGER columns to `Float64`.
///
/// The cast is non-strict: cells that cannot be read as numbers become null.
fn coerce_continuous(values: DataFrame, types: &FeatureTypes) -> Result<DataFrame> {
    let columns = values
        .get_columns()
        .iter()
        .map(|column| -> Result<Column> {
            let continuous = types
                .get(column.name().as_str())
                .is_some_and(|t| t.is_continuous());
            if continuous && column.dtype() != &DataType::Float64 {
                Ok(column.cast(&DataType::Float64)?)
            } else {
                Ok(column.clone())
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DataFrame::new(columns)?)
}
