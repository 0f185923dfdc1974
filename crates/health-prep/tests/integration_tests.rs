//! Integration tests for loading and encoding survey tables.
//!
//! These tests drive a [`Database`] over the CSV and metadata fixtures in
//! `tests/fixtures`.

use health_prep::{
    Database, DatabaseConfig, EncodeFilter, FeatureType, MissingValueCode, NullDataset,
    PrepError, TableStage,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> DatabaseConfig {
    DatabaseConfig::from_json_file(fixtures_path().join("db.json")).expect("fixture config")
}

fn database() -> Database {
    Database::from_config(config()).expect("valid fixture config")
}

fn column<'a>(df: &'a DataFrame, name: &str) -> &'a Series {
    df.column(name)
        .unwrap_or_else(|_| panic!("column {name} missing"))
        .as_materialized_series()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    column(df, name).f64().unwrap().into_iter().collect()
}

fn codes(df: &DataFrame, name: &str) -> Vec<Option<u8>> {
    column(df, name).u8().unwrap().into_iter().collect()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_paths_resolve_against_file() {
    let config = config();
    assert_eq!(config.acronym, "TS");
    assert_eq!(
        config.paths["adults"],
        fixtures_path().join("data/adults.csv")
    );
    assert_eq!(config.metadata_dir, fixtures_path().join("metadata"));
}

#[test]
fn test_available_paths_skip_missing_files() {
    let db = database();
    let available: Vec<String> = db.available_paths().into_keys().collect();
    assert_eq!(available, vec!["adults", "children", "clash", "dupes", "visits"]);
}

// ============================================================================
// Argument errors
// ============================================================================

#[test]
fn test_unavailable_table_is_fatal_and_loads_nothing() {
    let mut db = database();
    let err = db.load(&["adults", "household"]).unwrap_err();

    match err {
        PrepError::UnavailableTable { name, available } => {
            assert_eq!(name, "household");
            assert_eq!(available, vec!["adults", "children", "clash", "dupes", "visits"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(db.table_names().is_empty());
}

#[test]
fn test_invalid_name_lists() {
    let mut db = database();
    assert!(matches!(db.load(&[]), Err(PrepError::InvalidConfig(_))));
    assert!(matches!(
        db.load(&["adults", "adults"]),
        Err(PrepError::InvalidConfig(_))
    ));
}

// ============================================================================
// Full load
// ============================================================================

#[test]
fn test_load_adults_end_to_end() {
    let mut db = database();
    let report = db.load(&["adults"]).unwrap();

    assert!(report.is_complete());
    let outcome = report.get("adults").unwrap();
    assert_eq!(outcome.stage, TableStage::Encoded);
    assert_eq!(outcome.dropped_columns, vec!["record_id"]);
    assert_eq!(outcome.encoded_shape, Some((4, 11)));

    let encoded = db.encoded("adults").unwrap();
    assert_eq!(
        encoded.column_names(),
        vec![
            "region_north",
            "region_south",
            "general_health",
            "sex",
            "smoker",
            "bmi",
            "age",
            "birth_date",
            "interview_date_year",
            "interview_date_month",
            "interview_date_day",
        ]
    );
    assert_eq!(encoded.values.shape(), encoded.missing_values.shape());
    assert_eq!(
        encoded.feature_types.names(),
        encoded
            .values
            .get_column_names()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
    );

    let health: Vec<Option<i64>> = column(&encoded.values, "general_health")
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(health, vec![Some(2), Some(0), Some(1), Some(3)]);

    let smoker: Vec<Option<i64>> = column(&encoded.values, "smoker")
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(smoker, vec![Some(1), Some(0), None, Some(0)]);
    assert_eq!(
        codes(&encoded.missing_values, "smoker")[2],
        Some(MissingValueCode::NotApplicable.code())
    );

    let north: Vec<Option<u8>> = column(&encoded.values, "region_north")
        .u8()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(north, vec![Some(1), Some(0), None, Some(1)]);

    assert_eq!(floats(&encoded.values, "bmi"), vec![Some(22.5), None, Some(27.0), Some(30.1)]);
    assert_eq!(codes(&encoded.missing_values, "bmi"), vec![Some(0), Some(2), Some(0), Some(0)]);
    assert_eq!(floats(&encoded.values, "age"), vec![Some(34.0), Some(51.0), None, Some(62.0)]);
    assert_eq!(
        floats(&encoded.values, "birth_date"),
        vec![Some(0.0), Some(86400.0), Some(172800.0), None]
    );
    assert_eq!(
        floats(&encoded.values, "interview_date_month"),
        vec![Some(4.0), Some(6.0), Some(12.0), Some(2.0)]
    );
    assert_eq!(
        encoded.feature_types.get("interview_date_day"),
        Some(FeatureType::ContinuousInteger)
    );
}

#[test]
fn test_drop_list_removes_columns_and_types() {
    let mut db = database();
    db.load(&["adults"]).unwrap();

    let table = db.table("adults").unwrap();
    let types = db.feature_types("adults").unwrap();
    assert_eq!(table.width(), 9);
    assert_eq!(types.len(), 9);
    assert!(types.get("record_id").is_none());
    assert!(table.column("record_id").is_err());

    let missing = db.missing_values("adults").unwrap();
    assert_eq!(missing.shape(), table.shape());
    assert_eq!(db["adults"].shape(), (4, 9));
}

#[test]
fn test_repeated_drop_name_is_reported_once() {
    let mut config = config();
    config.drop.insert(
        "adults".to_string(),
        vec!["record_id".to_string(), "record_id".to_string()],
    );
    let mut db = Database::from_config(config).unwrap();
    let report = db.load(&["adults"]).unwrap();

    let adults = report.get("adults").unwrap();
    assert_eq!(adults.dropped_columns, vec!["record_id"]);
    assert_eq!(db.feature_types("adults").unwrap().len(), 10 - adults.dropped_columns.len());
}

#[test]
fn test_batch_with_type_mismatch_continues() {
    let mut db = database();
    let report = db.load(&["children", "adults"]).unwrap();

    let children = report.get("children").unwrap();
    assert_eq!(children.stage, TableStage::MissingDetected);
    assert_eq!(children.encoded_shape, None);
    let issue_codes: Vec<&str> = children.issues.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(issue_codes, vec!["TYPE_MISMATCH", "MISSING_COMPANION"]);

    assert!(db.encoded("children").is_none());
    assert!(db.feature_types("children").is_none());
    assert!(db.missing_values("children").is_some());

    assert_eq!(db.stage("adults"), TableStage::Encoded);
    assert_eq!(report.encoded_count(), 1);
    assert!(!report.is_complete());
}

#[test]
fn test_bad_tables_do_not_stop_the_batch() {
    let mut db = database();
    let report = db.load(&["dupes", "clash", "visits"]).unwrap();

    // A duplicated entry in the type file is a type mismatch.
    let dupes = report.get("dupes").unwrap();
    assert_eq!(dupes.stage, TableStage::MissingDetected);
    let codes: Vec<&str> = dupes.issues.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["TYPE_MISMATCH", "MISSING_COMPANION"]);

    // The indicator "sex_m" clashes with the continuous column of that name.
    let clash = report.get("clash").unwrap();
    assert_eq!(clash.stage, TableStage::MissingDetected);
    let codes: Vec<&str> = clash.issues.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["DUPLICATE_COLUMN"]);
    assert!(db.encoded("clash").is_none());
    assert!(db.feature_types("clash").is_some());

    assert_eq!(db.stage("visits"), TableStage::Encoded);
    assert_eq!(report.encoded_count(), 1);
}

#[test]
fn test_bad_order_file_is_recorded() {
    let mut db = database();
    let report = db.load(&["visits"]).unwrap();

    let visits = report.get("visits").unwrap();
    assert_eq!(visits.stage, TableStage::Encoded);
    assert_eq!(visits.issues.len(), 1);
    assert_eq!(visits.issues[0].code, "ORDER_FILE");
    assert!(db.ordinal_order("visits").is_none());

    // Without an order, categories are ranked lexicographically.
    let encoded = db.encoded("visits").unwrap();
    let clinic: Vec<Option<i64>> = column(&encoded.values, "clinic")
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(clinic, vec![Some(0), Some(1)]);
}

#[test]
fn test_reencode_with_no_stages() {
    let mut db = database();
    db.load(&["adults"]).unwrap();

    let report = db.encode(&["adults"], EncodeFilter::none()).unwrap();
    assert!(report.is_complete());

    let encoded = db.encoded("adults").unwrap();
    assert_eq!(
        encoded.column_names(),
        vec![
            "region",
            "general_health",
            "sex",
            "smoker",
            "bmi",
            "age",
            "birth_date",
            "interview_date",
        ]
    );
    let region = column(&encoded.values, "region");
    assert_eq!(region.dtype(), &DataType::String);
    assert_eq!(region.null_count(), 1);
    assert_eq!(floats(&encoded.values, "bmi")[1], None);
}

#[test]
fn test_custom_dataset_via_builder() {
    let mut db = Database::builder()
        .config(config())
        .dataset(Box::new(NullDataset::default()))
        .build()
        .unwrap();
    db.load(&["adults"]).unwrap();

    // Only nulls count as missing, and nothing is dropped.
    let missing = db.missing_values("adults").unwrap();
    assert_eq!(missing.width(), 10);
    assert_eq!(codes(missing, "region"), vec![Some(0), Some(0), Some(0), Some(0)]);
    assert_eq!(codes(missing, "age"), vec![Some(0), Some(0), Some(2), Some(0)]);
}

#[test]
fn test_load_report_serializes() {
    let mut db = database();
    let report = db.load(&["children"]).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tables"][0]["name"], "children");
    assert_eq!(json["tables"][0]["stage"], "missing_detected");
    assert_eq!(json["tables"][0]["issues"][0]["code"], "TYPE_MISMATCH");
}
