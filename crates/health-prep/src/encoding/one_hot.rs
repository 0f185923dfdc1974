//! One-hot encoding of CATEGORICAL columns.

use crate::error::Result;
use crate::partition::TypeGroup;
use crate::types::{FeatureType, FeatureTypes};
use crate::utils::{ensure_unique_names, renamed, series_to_strings};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Expands categorical columns into `UInt8` indicator columns.
pub struct OneHotEncoder;

impl OneHotEncoder {
    /// Replace every column of `group` by its indicator columns.
    ///
    /// Each indicator is named `{column}_{category}`, tagged CATEGORICAL and
    /// gets a copy of the source column's missing-value codes. Rows holding
    /// the placeholder (or null) have zeros in every indicator.
    pub fn encode(group: &mut TypeGroup, placeholder: &str) -> Result<()> {
        let mut values = Vec::new();
        let mut missing = Vec::new();
        let mut types = FeatureTypes::new();

        for column in group.values.get_columns() {
            let name = column.name().as_str();
            let codes = group.missing.column(name)?.as_materialized_series();
            let indicators = Self::encode_column(column.as_materialized_series(), placeholder)?;
            debug!("{}: {} indicator columns", name, indicators.len());

            for indicator in indicators {
                let indicator_name = indicator.name().to_string();
                missing.push(renamed(codes, &indicator_name).into_column());
                types.push(indicator_name, FeatureType::Categorical);
                values.push(indicator.into_column());
            }
        }

        ensure_unique_names(&values)?;
        group.values = DataFrame::new(values)?;
        group.missing = DataFrame::new(missing)?;
        group.types = types;
        Ok(())
    }

    /// Indicator columns of one column, in lexicographic category order.
    pub fn encode_column(series: &Series, placeholder: &str) -> Result<Vec<Series>> {
        let values = series_to_strings(series)?;
        let categories: BTreeSet<&str> = values
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|v| *v != placeholder)
            .collect();

        Ok(categories
            .into_iter()
            .map(|category| {
                let indicator: Vec<u8> = values
                    .iter()
                    .map(|v| u8::from(v.as_deref() == Some(category)))
                    .collect();
                Series::new(format!("{}_{}", series.name(), category).into(), indicator)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use pretty_assertions::assert_eq;

    const PH: &str = "z MISSING_VALUE";

    fn bits(df: &DataFrame, name: &str) -> Vec<Option<u8>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .u8()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_indicator_columns() {
        let series = Series::new("col".into(), &["x", "y", "x"]);
        let indicators = OneHotEncoder::encode_column(&series, PH).unwrap();

        let names: Vec<&str> = indicators.iter().map(|s| s.name().as_str()).collect();
        assert_eq!(names, vec!["col_x", "col_y"]);
        let x: Vec<Option<u8>> = indicators[0].u8().unwrap().into_iter().collect();
        let y: Vec<Option<u8>> = indicators[1].u8().unwrap().into_iter().collect();
        assert_eq!(x, vec![Some(1), Some(0), Some(1)]);
        assert_eq!(y, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_group_codes_and_types_follow_indicators() {
        let mut group = TypeGroup {
            values: df!(
                "region" => ["north", PH, "south"],
                "id" => ["a", "b", "c"]
            )
            .unwrap(),
            missing: df!(
                "region" => [0u8, 2, 0],
                "id" => [0u8, 0, 0]
            )
            .unwrap(),
            types: FeatureTypes::from_pairs([
                ("region", FeatureType::Categorical),
                ("id", FeatureType::Categorical),
            ]),
        };

        OneHotEncoder::encode(&mut group, PH).unwrap();

        assert_eq!(
            group.types.names(),
            vec!["region_north", "region_south", "id_a", "id_b", "id_c"]
        );
        assert_eq!(group.values.shape(), group.missing.shape());
        assert!(group.is_aligned());
        // Missing row is all zeros and keeps its code in every indicator.
        assert_eq!(bits(&group.values, "region_north"), vec![Some(1), Some(0), Some(0)]);
        assert_eq!(bits(&group.values, "region_south"), vec![Some(0), Some(0), Some(1)]);
        assert_eq!(bits(&group.missing, "region_south"), vec![Some(0), Some(2), Some(0)]);
    }

    #[test]
    fn test_indicator_names_colliding_within_group() {
        let mut group = TypeGroup {
            values: df!("a" => ["b_c"], "a_b" => ["c"]).unwrap(),
            missing: df!("a" => [0u8], "a_b" => [0u8]).unwrap(),
            types: FeatureTypes::from_pairs([
                ("a", FeatureType::Categorical),
                ("a_b", FeatureType::Categorical),
            ]),
        };

        assert!(matches!(
            OneHotEncoder::encode(&mut group, PH),
            Err(PrepError::DuplicateColumn(name)) if name == "a_b_c"
        ));
    }
}
