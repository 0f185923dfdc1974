//! Training Strategy Configurations
//!
//! Named bundles of estimator, cross-validation, hyperparameter search and
//! evaluation settings for models trained on prepared health-survey tables.
//!
//! # Overview
//!
//! - **Base strategies**: `Classification` and `Regression`, both
//!   gradient-boosting models tuned by randomized search inside nested
//!   cross-validation
//! - **Imputed variants**: a copy of each base strategy per [`Imputer`],
//!   named `{base}_imputed_{label}`
//! - **Parameters**: split counts, parallelism and optional evaluations read
//!   from a YAML file with per-field defaults
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use health_strategies::{StrategyParams, build_strategies, strategy};
//!
//! let params = StrategyParams::load("custom/strategy_params.yml")?;
//! let strategies = build_strategies(&params);
//!
//! let chosen = strategy(&strategies, "Classification_imputed_Med+mask")?;
//! println!("{}", chosen.to_json()?);
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod strategy;

// Re-exports for convenient access
pub use config::{StrategyParams, StrategyParamsBuilder, TaskKind};
pub use error::{Result, StrategyError};
pub use registry::{RANDOM_STATE, build_strategies, classification, regression, strategy};
pub use strategy::{
    CvSplitter, Estimator, ImportanceParams, Imputer, LearningCurveParams, Loss,
    ParamDistribution, Scoring, SearchMethod, SearchParams, Strategy,
};
