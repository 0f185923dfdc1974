//! Splitting tables into per-feature-type groups and merging them back.
//!
//! A column's value, missing-value code and type tag must always travel
//! together. [`PartitionedTable`] applies one split to the three structures
//! at once so the groups stay congruent through the encoding stages.

use crate::error::{PrepError, Result};
use crate::types::{FeatureType, FeatureTypes};
use crate::utils::ensure_unique_names;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Splits a table by feature type and concatenates the groups back.
pub struct ColumnPartitioner;

impl ColumnPartitioner {
    /// Group the columns of `table` by their feature type.
    ///
    /// Within a group, columns keep their relative order in `table`.
    pub fn partition(
        table: &DataFrame,
        types: &FeatureTypes,
    ) -> Result<BTreeMap<FeatureType, DataFrame>> {
        let mut grouped: BTreeMap<FeatureType, Vec<Column>> = BTreeMap::new();

        for column in table.get_columns() {
            let name = column.name().as_str();
            let feature_type = types
                .get(name)
                .ok_or_else(|| PrepError::ColumnNotFound(name.to_string()))?;
            grouped.entry(feature_type).or_default().push(column.clone());
        }

        grouped
            .into_iter()
            .map(|(t, columns)| Ok((t, DataFrame::new(columns)?)))
            .collect()
    }

    /// Group feature-type entries by type, keeping their order.
    pub fn partition_types(types: &FeatureTypes) -> BTreeMap<FeatureType, FeatureTypes> {
        let mut grouped: BTreeMap<FeatureType, FeatureTypes> = BTreeMap::new();
        for (name, t) in types.iter() {
            grouped.entry(t).or_default().push(name, t);
        }
        grouped
    }

    /// Concatenate groups into one table.
    ///
    /// Groups are taken in `order`; groups whose type is not listed follow in
    /// feature-type declaration order. Two groups holding the same column name
    /// give [`PrepError::DuplicateColumn`].
    pub fn merge(
        mut groups: BTreeMap<FeatureType, DataFrame>,
        order: &[FeatureType],
    ) -> Result<DataFrame> {
        let mut columns = Vec::new();
        for key in merge_order(groups.keys().copied(), order) {
            if let Some(df) = groups.remove(&key) {
                columns.extend(df.get_columns().iter().cloned());
            }
        }
        ensure_unique_names(&columns)?;
        Ok(DataFrame::new(columns)?)
    }

    /// Concatenate feature-type groups, following the same rules as [`merge`](Self::merge).
    pub fn merge_types(
        mut groups: BTreeMap<FeatureType, FeatureTypes>,
        order: &[FeatureType],
    ) -> FeatureTypes {
        let mut merged = FeatureTypes::new();
        for key in merge_order(groups.keys().copied(), order) {
            if let Some(types) = groups.remove(&key) {
                merged.extend(types);
            }
        }
        merged
    }
}

/// Keys in merge order: listed ones first, then the rest in declaration order.
fn merge_order(keys: impl Iterator<Item = FeatureType>, order: &[FeatureType]) -> Vec<FeatureType> {
    let keys: Vec<FeatureType> = keys.collect();
    let mut ordered: Vec<FeatureType> = order.iter().copied().filter(|k| keys.contains(k)).collect();
    let mut rest: Vec<FeatureType> = keys.into_iter().filter(|k| !order.contains(k)).collect();
    rest.sort();
    ordered.extend(rest);
    ordered
}

/// Values, missing-value codes and type tags of one feature-type group.
#[derive(Debug, Clone)]
pub struct TypeGroup {
    pub values: DataFrame,
    pub missing: DataFrame,
    pub types: FeatureTypes,
}

impl TypeGroup {
    /// Whether values, codes and tags name the same columns in the same order.
    pub fn is_aligned(&self) -> bool {
        let values = self.values.get_column_names();
        let missing = self.missing.get_column_names();
        let types = self.types.names();
        self.values.shape() == self.missing.shape()
            && values == missing
            && values.len() == types.len()
            && values.iter().zip(types.iter()).all(|(v, t)| v.as_str() == *t)
    }
}

/// A table split into congruent per-type groups.
#[derive(Debug, Clone, Default)]
pub struct PartitionedTable {
    groups: BTreeMap<FeatureType, TypeGroup>,
}

impl PartitionedTable {
    /// Split values, codes and types with the same keys and membership.
    pub fn split(values: &DataFrame, missing: &DataFrame, types: &FeatureTypes) -> Result<Self> {
        if values.shape() != missing.shape() {
            return Err(PrepError::InvalidConfig(format!(
                "value table {:?} and missing-value table {:?} differ in shape",
                values.shape(),
                missing.shape()
            )));
        }

        let mut value_groups = ColumnPartitioner::partition(values, types)?;
        let mut missing_groups = ColumnPartitioner::partition(missing, types)?;
        let type_groups = ColumnPartitioner::partition_types(types);

        let mut groups = BTreeMap::new();
        for (key, group_types) in type_groups {
            let (Some(values), Some(missing)) =
                (value_groups.remove(&key), missing_groups.remove(&key))
            else {
                // Type entries without a column in the table.
                continue;
            };
            groups.insert(
                key,
                TypeGroup {
                    values,
                    missing,
                    types: group_types,
                },
            );
        }

        let mut table = Self { groups };
        table.realign_types();
        Ok(table)
    }

    pub fn get(&self, key: FeatureType) -> Option<&TypeGroup> {
        self.groups.get(&key)
    }

    pub fn get_mut(&mut self, key: FeatureType) -> Option<&mut TypeGroup> {
        self.groups.get_mut(&key)
    }

    pub fn remove(&mut self, key: FeatureType) -> Option<TypeGroup> {
        self.groups.remove(&key)
    }

    pub fn insert(&mut self, key: FeatureType, group: TypeGroup) {
        self.groups.insert(key, group);
    }

    pub fn keys(&self) -> Vec<FeatureType> {
        self.groups.keys().copied().collect()
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = (&FeatureType, &mut TypeGroup)> {
        self.groups.iter_mut()
    }

    /// Whether every group is aligned.
    pub fn is_aligned(&self) -> bool {
        self.groups.values().all(TypeGroup::is_aligned)
    }

    /// Merge the groups back into values, codes and types.
    pub fn merge(self, order: &[FeatureType]) -> Result<(DataFrame, DataFrame, FeatureTypes)> {
        let mut values = BTreeMap::new();
        let mut missing = BTreeMap::new();
        let mut types = BTreeMap::new();
        for (key, group) in self.groups {
            values.insert(key, group.values);
            missing.insert(key, group.missing);
            types.insert(key, group.types);
        }
        Ok((
            ColumnPartitioner::merge(values, order)?,
            ColumnPartitioner::merge(missing, order)?,
            ColumnPartitioner::merge_types(types, order),
        ))
    }

    /// Reorder each group's type entries to follow its value columns.
    fn realign_types(&mut self) {
        for group in self.groups.values_mut() {
            let names = group.values.get_column_names();
            group.types = FeatureTypes::from_pairs(
                names
                    .iter()
                    .filter_map(|n| group.types.get(n.as_str()).map(|t| (n.to_string(), t))),
            );
        }
    }
}
