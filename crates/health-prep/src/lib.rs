//! Health Survey Preparation Library
//!
//! Turns the raw CSV tables of a health survey into model-ready matrices,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! For every table of a survey database the library provides:
//!
//! - **Feature Types**: Per-column semantic types read from metadata files
//! - **Missing-Value Detection**: A per-cell code (not missing, not applicable, not available)
//! - **Column Dropping**: Dataset-specific lists of columns to discard
//! - **Encoding**: Ordinal ranks, one-hot indicators and date expansion, with
//!   missing cells kept as nulls and their codes carried alongside
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use health_prep::{Database, DatabaseConfig};
//!
//! let config = DatabaseConfig::builder()
//!     .name("National Health Interview Survey")
//!     .acronym("NHIS")
//!     .path("adults", "data/adults.csv")
//!     .path("children", "data/children.csv")
//!     .drop_columns("adults", ["record_id"])
//!     .build()?;
//!
//! let mut db = Database::from_config(config)?;
//! let report = db.load(&["adults", "children"])?;
//!
//! for table in &report.tables {
//!     println!("{}: {}", table.name, table.stage.display_name());
//! }
//!
//! let encoded = db.encoded("adults").expect("adults encoded");
//! println!("{:?}", encoded.values.shape());
//! ```
//!
//! # Metadata Layout
//!
//! Metadata lives under [`DatabaseConfig::metadata_dir`]:
//!
//! - `types/{acronym}/{table}.csv`: header row, then `column,type` rows
//! - `ordinal_orders/{acronym}/{table}.yml`: optional, column → ordered labels
//!
//! # Custom Datasets
//!
//! The missing-value heuristic and the drop lists come from a
//! [`Dataset`](missing::Dataset). Two are built in ([`MarkerDataset`] and
//! [`NullDataset`]); others can be plugged in with
//! [`DatabaseBuilder::dataset`].

pub mod config;
pub mod database;
pub mod encoding;
pub mod error;
pub mod missing;
pub mod partition;
pub mod registry;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, DEFAULT_PLACEHOLDER, DatabaseConfig, DatabaseConfigBuilder,
    EncodeFilter, EncodingStage,
};
pub use database::{Database, DatabaseBuilder};
pub use encoding::{EncodeOptions, EncodingPipeline};
pub use error::{PrepError, Result as PrepResult, ResultExt};
pub use missing::{Dataset, DatasetKind, Detection, MarkerDataset, MissingValueDetector, NullDataset};
pub use partition::{ColumnPartitioner, PartitionedTable, TypeGroup};
pub use registry::{CsvFeatureTypeSource, FeatureTypeRegistry, FeatureTypeSource};
pub use types::{
    EncodedTable, FeatureType, FeatureTypes, LoadReport, MissingValueCode, OrdinalOrder,
    TableIssue, TableOutcome, TableStage,
};
