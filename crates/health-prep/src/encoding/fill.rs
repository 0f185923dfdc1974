//! Placeholder fill before categorical encoding and null fill after it.

use crate::error::Result;
use crate::partition::TypeGroup;
use crate::utils::{missing_mask, series_to_strings};
use polars::prelude::*;
use tracing::debug;

/// Write `placeholder` into every cell whose code is not NOT_MISSING.
///
/// Only columns that actually receive the placeholder are turned into string
/// columns; the others keep their dtype. Returns the number of filled cells.
pub fn pre_fill(group: &mut TypeGroup, placeholder: &str) -> Result<usize> {
    let mut filled = 0;
    let mut columns = Vec::with_capacity(group.values.width());

    for column in group.values.get_columns() {
        let name = column.name().as_str();
        let mask = missing_mask(group.missing.column(name)?.as_materialized_series())?;
        let n_masked = mask.iter().filter(|m| **m).count();

        if n_masked == 0 {
            columns.push(column.clone());
            continue;
        }

        let values: Vec<Option<String>> = series_to_strings(column.as_materialized_series())?
            .into_iter()
            .zip(mask.iter())
            .map(|(v, masked)| if *masked { Some(placeholder.to_string()) } else { v })
            .collect();

        debug!("{}: {} cells set to placeholder", name, n_masked);
        filled += n_masked;
        columns.push(Series::new(name.into(), values).into_column());
    }

    group.values = DataFrame::new(columns)?;
    Ok(filled)
}

/// Set every cell whose code is not NOT_MISSING to null.
///
/// Returns the number of cells set to null.
pub fn post_fill(group: &mut TypeGroup) -> Result<usize> {
    let mut cleared = 0;
    let mut columns = Vec::with_capacity(group.values.width());

    for column in group.values.get_columns() {
        let name = column.name().as_str();
        let mask = missing_mask(group.missing.column(name)?.as_materialized_series())?;
        let n_masked = mask.iter().filter(|m| **m).count();

        if n_masked == 0 {
            columns.push(column.clone());
            continue;
        }

        let series = column.as_materialized_series();
        let keep: Vec<bool> = mask.iter().map(|m| !m).collect();
        let keep = BooleanChunked::from_slice(PlSmallStr::EMPTY, &keep);
        let nulls = Series::full_null(name.into(), series.len(), series.dtype());

        cleared += n_masked;
        columns.push(series.zip_with(&keep, &nulls)?.into_column());
    }

    group.values = DataFrame::new(columns)?;
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureType, FeatureTypes};
    use pretty_assertions::assert_eq;

    fn group() -> TypeGroup {
        TypeGroup {
            values: df!(
                "height" => [Some(1.7), Some(-9.0), None],
                "weight" => [60.0, 70.0, 80.0]
            )
            .unwrap(),
            missing: df!(
                "height" => [0u8, 2, 2],
                "weight" => [0u8, 0, 0]
            )
            .unwrap(),
            types: FeatureTypes::from_pairs([
                ("height", FeatureType::ContinuousReal),
                ("weight", FeatureType::ContinuousReal),
            ]),
        }
    }

    #[test]
    fn test_pre_fill_only_touches_masked_columns() {
        let mut g = group();
        let filled = pre_fill(&mut g, "z MISSING_VALUE").unwrap();

        assert_eq!(filled, 2);
        assert_eq!(g.values.column("height").unwrap().dtype(), &DataType::String);
        assert_eq!(g.values.column("weight").unwrap().dtype(), &DataType::Float64);
        let height: Vec<Option<String>> =
            series_to_strings(g.values.column("height").unwrap().as_materialized_series()).unwrap();
        assert_eq!(
            height,
            vec![
                Some("1.7".to_string()),
                Some("z MISSING_VALUE".to_string()),
                Some("z MISSING_VALUE".to_string()),
            ]
        );
    }

    #[test]
    fn test_post_fill_nulls_masked_cells() {
        let mut g = group();
        let cleared = post_fill(&mut g).unwrap();

        assert_eq!(cleared, 2);
        let height = g.values.column("height").unwrap().as_materialized_series().clone();
        assert_eq!(height.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = height.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.7), None, None]);
        assert_eq!(g.values.shape(), g.missing.shape());
    }
}
