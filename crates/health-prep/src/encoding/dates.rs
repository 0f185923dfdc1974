//! Date parsing and the two date encodings.
//!
//! Dates are read day-first. A DATE_EXPLODED column becomes three integer
//! columns (`_year`, `_month`, `_day`); a DATE_TIMESTAMP column becomes
//! seconds since the Unix epoch.

use crate::error::{PrepError, Result};
use crate::partition::TypeGroup;
use crate::types::{FeatureType, FeatureTypes};
use crate::utils::{renamed, series_to_strings};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// Date shapes and the chrono format that reads each of them.
static DATE_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("Invalid regex: DD/MM/YYYY"),
            "%d/%m/%Y",
        ),
        (
            Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("Invalid regex: DD-MM-YYYY"),
            "%d-%m-%Y",
        ),
        (
            Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}$").expect("Invalid regex: DD.MM.YYYY"),
            "%d.%m.%Y",
        ),
        (
            Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
            "%Y-%m-%d",
        ),
    ]
});

/// Parse a date, day first, with an optional ` HH:MM[:SS]` or `THH:MM[:SS]` time.
pub fn parse_day_first(column: &str, value: &str) -> Result<NaiveDateTime> {
    let err = || PrepError::DateParse {
        column: column.to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (date_part, time_part) = match trimmed.split_once([' ', 'T']) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (trimmed, None),
    };

    let format = DATE_FORMATS
        .iter()
        .find(|(re, _)| re.is_match(date_part))
        .map(|(_, f)| *f)
        .ok_or_else(err)?;
    let date = NaiveDate::parse_from_str(date_part, format).map_err(|_| err())?;

    let time = match time_part {
        None => NaiveTime::MIN,
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .map_err(|_| err())?,
    };

    Ok(date.and_time(time))
}

/// Parse every cell of a column. Unparseable cells become `None`.
fn parse_column(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    let name = series.name().as_str();
    let mut failed = 0;
    let parsed = series_to_strings(series)?
        .iter()
        .map(|v| {
            let v = v.as_deref()?;
            match parse_day_first(name, v) {
                Ok(dt) => Some(dt),
                Err(_) => {
                    failed += 1;
                    None
                }
            }
        })
        .collect();

    if failed > 0 {
        debug!("{}: {} cells could not be parsed as dates", name, failed);
    }
    Ok(parsed)
}

/// Applies the date encodings to a group.
pub struct DateEncoder;

impl DateEncoder {
    /// Expand every column into `{column}_year`, `{column}_month`, `{column}_day`.
    ///
    /// The new columns are tagged CONTINUOUS_INTEGER and inherit the source
    /// column's missing-value codes.
    pub fn explode(group: &mut TypeGroup) -> Result<()> {
        let mut values = Vec::new();
        let mut missing = Vec::new();
        let mut types = FeatureTypes::new();

        for column in group.values.get_columns() {
            let name = column.name().as_str();
            let codes = group.missing.column(name)?.as_materialized_series();
            let parsed = parse_column(column.as_materialized_series())?;

            let parts: [(&str, fn(&NaiveDateTime) -> i64); 3] = [
                ("year", |d| i64::from(d.year())),
                ("month", |d| i64::from(d.month())),
                ("day", |d| i64::from(d.day())),
            ];
            for (suffix, part) in parts {
                let part_name = format!("{}_{}", name, suffix);
                let part_values: Vec<Option<i64>> =
                    parsed.iter().map(|d| d.as_ref().map(part)).collect();
                values.push(Series::new(part_name.as_str().into(), part_values).into_column());
                missing.push(renamed(codes, &part_name).into_column());
                types.push(part_name, FeatureType::ContinuousInteger);
            }
        }

        group.values = DataFrame::new(values)?;
        group.missing = DataFrame::new(missing)?;
        group.types = types;
        Ok(())
    }

    /// Replace every column by its `Float64` Unix timestamp in seconds.
    pub fn timestamp(group: &mut TypeGroup) -> Result<()> {
        let mut values = Vec::with_capacity(group.values.width());

        for column in group.values.get_columns() {
            let parsed = parse_column(column.as_materialized_series())?;
            let seconds: Vec<Option<f64>> = parsed
                .iter()
                .map(|d| d.map(|d| d.and_utc().timestamp() as f64))
                .collect();
            values.push(Series::new(column.name().clone(), seconds).into_column());
        }

        group.values = DataFrame::new(values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_parse_day_first_formats() {
        assert_eq!(parse_day_first("d", "03/04/2020").unwrap(), ymd(2020, 4, 3));
        assert_eq!(parse_day_first("d", "3-4-2020").unwrap(), ymd(2020, 4, 3));
        assert_eq!(parse_day_first("d", "03.04.2020").unwrap(), ymd(2020, 4, 3));
        assert_eq!(parse_day_first("d", "2020-04-03").unwrap(), ymd(2020, 4, 3));
    }

    #[test]
    fn test_parse_with_time() {
        let dt = parse_day_first("d", "2020-04-03T10:30:15").unwrap();
        assert_eq!(dt, ymd(2020, 4, 3) + chrono::Duration::seconds(10 * 3600 + 30 * 60 + 15));
        let dt = parse_day_first("d", "03/04/2020 08:05").unwrap();
        assert_eq!(dt, ymd(2020, 4, 3) + chrono::Duration::seconds(8 * 3600 + 5 * 60));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_day_first("visit", "yesterday"),
            Err(PrepError::DateParse { column, .. }) if column == "visit"
        ));
        // Day 31 of April does not exist.
        assert!(parse_day_first("visit", "31/04/2020").is_err());
    }

    fn group(name: &str, dates: &[Option<&str>], codes: &[u8], t: FeatureType) -> TypeGroup {
        TypeGroup {
            values: DataFrame::new(vec![Series::new(name.into(), dates).into_column()]).unwrap(),
            missing: DataFrame::new(vec![Series::new(name.into(), codes).into_column()]).unwrap(),
            types: FeatureTypes::from_pairs([(name, t)]),
        }
    }

    #[test]
    fn test_explode() {
        let mut g = group(
            "visit",
            &[Some("25/12/2019"), None, Some("not a date")],
            &[0, 2, 0],
            FeatureType::DateExploded,
        );
        DateEncoder::explode(&mut g).unwrap();

        assert_eq!(g.types.names(), vec!["visit_year", "visit_month", "visit_day"]);
        assert!(g.types.iter().all(|(_, t)| t == FeatureType::ContinuousInteger));
        assert!(g.is_aligned());
        let years: Vec<Option<i64>> = g
            .values
            .column("visit_year")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(2019), None, None]);
        let codes: Vec<Option<u8>> = g
            .missing
            .column("visit_day")
            .unwrap()
            .as_materialized_series()
            .u8()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(codes, vec![Some(0), Some(2), Some(0)]);
    }

    #[test]
    fn test_timestamp() {
        let mut g = group(
            "birth",
            &[Some("01/01/1970"), Some("02/01/1970 00:00:10")],
            &[0, 0],
            FeatureType::DateTimestamp,
        );
        DateEncoder::timestamp(&mut g).unwrap();

        let seconds: Vec<Option<f64>> = g
            .values
            .column("birth")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(seconds, vec![Some(0.0), Some(86410.0)]);
        assert_eq!(g.types.get("birth"), Some(FeatureType::DateTimestamp));
    }
}
