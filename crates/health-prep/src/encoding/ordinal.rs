//! Ordinal encoding of ORDINAL and BINARY columns.

use crate::error::Result;
use crate::partition::TypeGroup;
use crate::types::OrdinalOrder;
use crate::utils::series_to_strings;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Maps categories to integer ranks.
pub struct OrdinalEncoder;

impl OrdinalEncoder {
    /// Encode every column of `group` in place.
    ///
    /// `binary` only changes logging: a binary column observing more than two
    /// categories is reported but still encoded.
    pub fn encode(
        group: &mut TypeGroup,
        order: Option<&OrdinalOrder>,
        placeholder: &str,
        binary: bool,
    ) -> Result<()> {
        let mut columns = Vec::with_capacity(group.values.width());

        for column in group.values.get_columns() {
            let name = column.name().as_str();
            let explicit = order.and_then(|o| o.get(name));
            let encoded = Self::encode_column(column.as_materialized_series(), explicit, placeholder)?;

            if binary && encoded.categories.len() > 2 {
                warn!(
                    "{}: binary column has {} categories {:?}",
                    name,
                    encoded.categories.len(),
                    encoded.categories
                );
            }
            debug!(
                "{}: {} categories ({})",
                name,
                encoded.categories.len(),
                if explicit.is_some() { "explicit order" } else { "sorted" }
            );
            columns.push(encoded.series.into_column());
        }

        group.values = DataFrame::new(columns)?;
        Ok(())
    }

    /// Encode one column.
    ///
    /// With an explicit order, a category's rank is its index in that order.
    /// Otherwise the observed categories are ranked in lexicographic order.
    /// The placeholder and labels outside an explicit order get the reserved
    /// rank `n_categories`. Nulls stay null.
    pub fn encode_column(
        series: &Series,
        order: Option<&[String]>,
        placeholder: &str,
    ) -> Result<EncodedColumn> {
        let values = series_to_strings(series)?;

        let categories: Vec<String> = match order {
            Some(order) => order.to_vec(),
            None => values
                .iter()
                .flatten()
                .filter(|v| v.as_str() != placeholder)
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        let ranks: HashMap<&str, i64> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i as i64))
            .collect();
        let reserved = categories.len() as i64;

        let encoded: Vec<Option<i64>> = values
            .iter()
            .map(|v| {
                v.as_deref()
                    .map(|v| ranks.get(v).copied().unwrap_or(reserved))
            })
            .collect();

        Ok(EncodedColumn {
            series: Series::new(series.name().clone(), encoded),
            categories,
        })
    }
}

/// Rank column together with the categories it was ranked against.
#[derive(Debug, Clone)]
pub struct EncodedColumn {
    pub series: Series,
    pub categories: Vec<String>,
}
