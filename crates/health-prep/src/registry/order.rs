//! Ordinal order files.

use crate::error::{PrepError, Result};
use crate::types::OrdinalOrder;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Load the ordinal order file of a table.
///
/// The file maps column names to their ordered labels:
///
/// ```yaml
/// health_status: [Poor, Fair, Good, Very good, Excellent]
/// education: [1, 2, 3, 4]
/// ```
///
/// Returns `Ok(None)` when the file does not exist and
/// [`PrepError::OrderFile`] when it cannot be parsed.
pub fn load_ordinal_order(path: &Path, table: &str) -> Result<Option<OrdinalOrder>> {
    if !path.exists() {
        info!("Order file not found. No order loaded for {}.", table);
        return Ok(None);
    }

    let text = std::fs::read_to_string(path)?;
    parse_ordinal_order(&text, table).map(Some)
}

/// Parse the YAML text of an ordinal order file.
pub(crate) fn parse_ordinal_order(text: &str, table: &str) -> Result<OrdinalOrder> {
    let order_error = |reason: String| PrepError::OrderFile {
        table: table.to_string(),
        reason,
    };

    let raw: BTreeMap<String, Vec<Value>> =
        serde_yaml::from_str(text).map_err(|e| order_error(e.to_string()))?;

    let mut columns = BTreeMap::new();
    for (column, labels) in raw {
        let labels = labels
            .iter()
            .map(scalar_label)
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| order_error(format!("non-scalar label in '{}'", column)))?;
        columns.insert(column, labels);
    }

    Ok(OrdinalOrder::new(columns))
}

/// Render a YAML scalar the way its CSV cell would be read back.
fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
