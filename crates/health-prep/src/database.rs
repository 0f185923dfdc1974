//! The survey database: loads tables and drives them through the pipeline.
//!
//! Each requested table goes through the same steps:
//!
//! 1. Read the CSV file
//! 2. Load feature types
//! 3. Drop the dataset's unwanted columns
//! 4. Load the ordinal order file, if any
//! 5. Detect missing values
//! 6. Encode
//!
//! Argument errors and unreadable CSV files abort the call. Problems that
//! only concern one table are logged and recorded in the [`LoadReport`]; the
//! table keeps whatever it reached and the batch goes on.

use crate::config::{DatabaseConfig, EncodeFilter};
use crate::encoding::{EncodeOptions, EncodingPipeline};
use crate::error::{PrepError, Result, ResultExt};
use crate::missing::{Dataset, MissingValueDetector};
use crate::registry::{CsvFeatureTypeSource, FeatureTypeRegistry, FeatureTypeSource, load_ordinal_order};
use crate::types::{EncodedTable, FeatureTypes, LoadReport, OrdinalOrder, TableOutcome, TableStage};
use crate::utils::column_names;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything known about one loaded table.
#[derive(Debug, Clone)]
struct TableEntry {
    stage: TableStage,
    raw: DataFrame,
    feature_types: Option<FeatureTypes>,
    ordinal_order: Option<OrdinalOrder>,
    missing_values: Option<DataFrame>,
    encoded: Option<EncodedTable>,
}

impl TableEntry {
    fn new(raw: DataFrame) -> Self {
        Self {
            stage: TableStage::RawLoaded,
            raw,
            feature_types: None,
            ordinal_order: None,
            missing_values: None,
            encoded: None,
        }
    }

    fn outcome(&self, name: &str) -> TableOutcome {
        let mut outcome = TableOutcome::new(name);
        outcome.stage = self.stage;
        outcome.rows = self.raw.height();
        outcome.columns = self.raw.width();
        outcome.encoded_shape = self.encoded.as_ref().map(EncodedTable::shape);
        outcome
    }
}

/// A survey made of several CSV tables.
///
/// Use [`Database::builder()`] or [`Database::from_config()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use health_prep::{Database, DatabaseConfig};
///
/// let config = DatabaseConfig::from_json_file("nhis.json")?;
/// let mut db = Database::from_config(config)?;
/// let report = db.load(&["adults", "children"])?;
///
/// if let Some(encoded) = db.encoded("adults") {
///     println!("{:?}", encoded.shape());
/// }
/// ```
pub struct Database {
    config: DatabaseConfig,
    dataset: Box<dyn Dataset>,
    source: Box<dyn FeatureTypeSource>,
    tables: BTreeMap<String, TableEntry>,
}

// Ensure Database is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Database: Send);

impl Database {
    /// Create a database from its parts.
    pub fn new(
        config: DatabaseConfig,
        dataset: Box<dyn Dataset>,
        source: Box<dyn FeatureTypeSource>,
    ) -> Self {
        Self {
            config,
            dataset,
            source,
            tables: BTreeMap::new(),
        }
    }

    /// Create a database using the dataset and metadata directory named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidConfig`] if `config` does not validate.
    pub fn from_config(config: DatabaseConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a new database builder.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn acronym(&self) -> &str {
        &self.config.acronym
    }

    /// Configured tables whose file exists.
    pub fn available_paths(&self) -> BTreeMap<String, PathBuf> {
        self.config
            .paths
            .iter()
            .filter(|(_, p)| p.exists())
            .map(|(n, p)| (n.clone(), p.clone()))
            .collect()
    }

    /// Load, detect missing values and encode the given tables.
    ///
    /// # Errors
    ///
    /// - [`PrepError::InvalidConfig`] for an empty list, an empty name or a
    ///   duplicated name
    /// - [`PrepError::UnavailableTable`] when a name has no existing file;
    ///   checked before any table is read
    /// - CSV read errors
    ///
    /// Per-table problems are not errors: see [`LoadReport`].
    pub fn load(&mut self, names: &[&str]) -> Result<LoadReport> {
        let start_time = Instant::now();
        validate_names(names)?;

        let available = self.available_paths();
        for name in names {
            if !available.contains_key(*name) {
                return Err(PrepError::UnavailableTable {
                    name: name.to_string(),
                    available: available.keys().cloned().collect(),
                });
            }
        }

        info!(
            "Loading {} table(s) from {} ({})",
            names.len(),
            self.config.name,
            self.config.acronym
        );

        let options = EncodeOptions::from_config(&self.config);
        let mut report = LoadReport::default();
        for name in names {
            let path = &available[*name];
            report.tables.push(self.load_table(name, path, &options)?);
        }

        info!(
            "Loaded {} table(s), {} encoded, in {:.2?}",
            report.tables.len(),
            report.encoded_count(),
            start_time.elapsed()
        );
        Ok(report)
    }

    /// Re-run encoding for already loaded tables with another stage selection.
    pub fn encode(&mut self, names: &[&str], filter: EncodeFilter) -> Result<LoadReport> {
        validate_names(names)?;
        for name in names {
            if !self.tables.contains_key(*name) {
                return Err(PrepError::InvalidConfig(format!(
                    "table '{}' is not loaded",
                    name
                )));
            }
        }

        let options = EncodeOptions::from_config(&self.config).with_filter(filter);
        info!("Encoding {} table(s) with stages: {}", names.len(), filter);

        let mut report = LoadReport::default();
        for name in names {
            let mut issues = Vec::new();
            if let Err(e) = self.encode_table(name, &options) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("{}", e);
                issues.push(e);
            }
            let mut outcome = self.tables[*name].outcome(name);
            for e in &issues {
                outcome.add_issue(e);
            }
            report.tables.push(outcome);
        }
        Ok(report)
    }

    fn load_table(&mut self, name: &str, path: &Path, options: &EncodeOptions) -> Result<TableOutcome> {
        let mut issues: Vec<PrepError> = Vec::new();

        info!("{}: Step 1: Reading {}", name, path.display());
        let raw = self.read_csv(path)?;
        debug!("{}: {} rows, {} columns", name, raw.height(), raw.width());
        let mut entry = TableEntry::new(raw);

        info!("{}: Step 2: Loading feature types...", name);
        let registry = FeatureTypeRegistry::new(self.source.as_ref(), &self.config.acronym);
        match registry.load(name, &entry.raw) {
            Ok(types) => {
                debug!("{}: feature types {:?}", name, types.counts());
                entry.feature_types = Some(types);
                entry.stage = TableStage::TypesLoaded;
            }
            Err(e) => {
                warn!("{}: error while loading feature types: {}. Ignored.", name, e);
                issues.push(e);
            }
        }

        info!("{}: Step 3: Dropping columns...", name);
        let dropped = self.drop_columns(name, &mut entry)?;
        entry.stage = entry.stage.max(TableStage::Dropped);

        info!("{}: Step 4: Loading ordinal orders...", name);
        let order_path = self.order_path(name);
        match load_ordinal_order(&order_path, name) {
            Ok(order) => entry.ordinal_order = order,
            Err(e) => {
                warn!("{}. No order loaded for {}.", e, name);
                issues.push(e);
            }
        }

        info!("{}: Step 5: Detecting missing values...", name);
        let detection = MissingValueDetector::detect(&entry.raw, self.dataset.as_ref())?;
        let skipped = detection.skipped_columns();
        entry.missing_values = Some(detection.missing_values);
        entry.stage = TableStage::MissingDetected;

        self.tables.insert(name.to_string(), entry);

        info!("{}: Step 6: Encoding...", name);
        if let Err(e) = self.encode_table(name, options) {
            if !e.is_recoverable() {
                return Err(e);
            }
            warn!("{}", e);
            issues.push(e);
        }

        let mut outcome = self.tables[name].outcome(name);
        outcome.dropped_columns = dropped;
        outcome.skipped_columns = skipped;
        for e in &issues {
            outcome.add_issue(e);
        }
        Ok(outcome)
    }

    fn read_csv(&self, path: &Path) -> Result<DataFrame> {
        let separator = self.config.separator_byte();
        CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_separator(separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context(format!("Reading {}", path.display()))?
            .finish()
            .context(format!("Reading {}", path.display()))
    }

    /// Remove the dataset's drop list from the table and its feature types.
    ///
    /// Names the table does not have are reported and ignored.
    fn drop_columns(&self, name: &str, entry: &mut TableEntry) -> Result<Vec<String>> {
        let Some(to_drop) = self.dataset.to_drop(name) else {
            return Ok(Vec::new());
        };

        let columns: HashSet<String> = column_names(&entry.raw).into_iter().collect();
        let mut seen = HashSet::new();
        let (present, absent): (Vec<String>, Vec<String>) = to_drop
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .partition(|c| columns.contains(c));
        if !absent.is_empty() {
            warn!("{}: columns to drop not in table: {:?}", name, absent);
        }

        info!(
            "{}: Dropping {} cols out of {}",
            name,
            present.len(),
            entry.raw.width()
        );

        let kept: Vec<String> = column_names(&entry.raw)
            .into_iter()
            .filter(|c| !present.contains(c))
            .collect();
        entry.raw = entry.raw.select(kept)?;
        if let Some(types) = entry.feature_types.as_mut() {
            let removed = types.drop_columns(&present);
            debug!("{}: {} feature types removed", name, removed);
        }
        Ok(present)
    }

    fn order_path(&self, name: &str) -> PathBuf {
        self.config
            .metadata_dir
            .join("ordinal_orders")
            .join(&self.config.acronym)
            .join(format!("{}.yml", name))
    }

    fn encode_table(&mut self, name: &str, options: &EncodeOptions) -> Result<()> {
        let entry = self
            .tables
            .get_mut(name)
            .ok_or_else(|| PrepError::InvalidConfig(format!("table '{}' is not loaded", name)))?;

        let types = entry
            .feature_types
            .as_ref()
            .ok_or_else(|| PrepError::MissingCompanion {
                table: name.to_string(),
                companion: "feature types",
            })?;
        let missing = entry
            .missing_values
            .as_ref()
            .ok_or_else(|| PrepError::MissingCompanion {
                table: name.to_string(),
                companion: "missing values",
            })?;

        let encoded = EncodingPipeline::encode(
            &entry.raw,
            missing,
            types,
            entry.ordinal_order.as_ref(),
            options,
        )
        .context(format!("Encoding {}", name))?;

        info!("{}: encoded shape {:?}", name, encoded.shape());
        entry.encoded = Some(encoded);
        entry.stage = TableStage::Encoded;
        Ok(())
    }

    /// Raw table (after column drop), if loaded.
    pub fn table(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name).map(|e| &e.raw)
    }

    /// Names of the loaded tables.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn feature_types(&self, name: &str) -> Option<&FeatureTypes> {
        self.tables.get(name).and_then(|e| e.feature_types.as_ref())
    }

    pub fn missing_values(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name).and_then(|e| e.missing_values.as_ref())
    }

    pub fn ordinal_order(&self, name: &str) -> Option<&OrdinalOrder> {
        self.tables.get(name).and_then(|e| e.ordinal_order.as_ref())
    }

    pub fn encoded(&self, name: &str) -> Option<&EncodedTable> {
        self.tables.get(name).and_then(|e| e.encoded.as_ref())
    }

    /// Stage a table has reached; `Unloaded` for unknown names.
    pub fn stage(&self, name: &str) -> TableStage {
        self.tables
            .get(name)
            .map_or(TableStage::Unloaded, |e| e.stage)
    }
}

impl Index<&str> for Database {
    type Output = DataFrame;

    /// Raw table by name.
    ///
    /// # Panics
    ///
    /// Panics if no table of that name is loaded.
    fn index(&self, name: &str) -> &DataFrame {
        match self.table(name) {
            Some(table) => table,
            None => panic!("no table named '{}' is loaded", name),
        }
    }
}

fn validate_names(names: &[&str]) -> Result<()> {
    if names.is_empty() {
        return Err(PrepError::InvalidConfig(
            "table names to load must not be empty".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(PrepError::InvalidConfig("empty table name".to_string()));
        }
        if !seen.insert(*name) {
            return Err(PrepError::InvalidConfig(format!(
                "table '{}' requested twice",
                name
            )));
        }
    }
    Ok(())
}

/// Builder for creating a [`Database`] with custom parts.
#[derive(Default)]
pub struct DatabaseBuilder {
    config: Option<DatabaseConfig>,
    dataset: Option<Box<dyn Dataset>>,
    source: Option<Box<dyn FeatureTypeSource>>,
}

// Ensure DatabaseBuilder is Send
static_assertions::assert_impl_all!(DatabaseBuilder: Send);

impl DatabaseBuilder {
    /// Set the database configuration.
    pub fn config(mut self, config: DatabaseConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom dataset instead of the one named in the configuration.
    pub fn dataset(mut self, dataset: Box<dyn Dataset>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Use a custom feature-type source instead of the CSV metadata files.
    pub fn feature_type_source(mut self, source: Box<dyn FeatureTypeSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the database.
    ///
    /// The configuration is required and validated.
    pub fn build(self) -> Result<Database> {
        let config = self
            .config
            .ok_or_else(|| PrepError::InvalidConfig("no configuration given".to_string()))?;
        config
            .validate()
            .map_err(|e| PrepError::InvalidConfig(e.to_string()))?;

        let dataset = match self.dataset {
            Some(dataset) => dataset,
            None => config.dataset.build(&config),
        };
        let source = match self.source {
            Some(source) => source,
            None => Box::new(CsvFeatureTypeSource::new(config.metadata_dir.clone())),
        };
        Ok(Database::new(config, dataset, source))
    }
}
