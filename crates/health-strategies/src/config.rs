//! Parameters shared by every training strategy.
//!
//! This module provides [`StrategyParams`] and its builder, plus the
//! [`TaskKind`] enum.
//!
//! # Example
//!
//! ```
//! use health_strategies::StrategyParams;
//!
//! let params = StrategyParams::builder()
//!     .n_outer_splits(5)
//!     .n_iter(20)
//!     .compute_importance(true)
//!     .build()
//!     .expect("valid params");
//! ```

use crate::error::{Result, StrategyError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// The kind of prediction task a strategy solves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Predicting a discrete class.
    #[default]
    Classification,
    /// Predicting a continuous value.
    Regression,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Classification => "classification",
            TaskKind::Regression => "regression",
        }
    }
}

/// Tunable numbers shared by all strategies.
///
/// Any field missing from a parameter file keeps its default.
///
/// # Validation
///
/// [`validate()`](Self::validate) checks that:
/// - `n_outer_splits` is at least 2
/// - `n_inner_splits`, `n_iter` and `n_repeats` are at least 1
/// - `n_jobs` is -1 or positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Folds of the outer (evaluation) cross-validation (default: 2).
    pub n_outer_splits: u32,

    /// Splits of the inner (search) cross-validation (default: 2).
    pub n_inner_splits: u32,

    /// Parallel jobs (default: 1).
    ///
    /// - `-1`: Use all available CPU cores
    /// - `n >= 1`: Use exactly `n` cores
    pub n_jobs: i32,

    /// Sampled candidates per randomized search (default: 1).
    pub n_iter: u32,

    /// Permutations per feature when computing importance (default: 1).
    pub n_repeats: u32,

    /// Whether to compute permutation feature importance (default: false).
    pub compute_importance: bool,

    /// Whether to compute learning curves (default: false).
    pub learning_curve: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            n_outer_splits: 2,
            n_inner_splits: 2,
            n_jobs: 1,
            n_iter: 1,
            n_repeats: 1,
            compute_importance: false,
            learning_curve: false,
        }
    }
}

impl StrategyParams {
    /// Create a new builder for `StrategyParams`.
    #[must_use]
    pub fn builder() -> StrategyParamsBuilder {
        StrategyParamsBuilder::default()
    }

    /// Read parameters from a YAML file, or use the defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the values it contains are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No strategy parameter file at {}. Using defaults.", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let params = Self::from_yaml_str(&text)?;
        info!("Strategy parameters loaded from {}", path.display());
        Ok(params)
    }

    /// Parse parameters from YAML text. An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let params: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the parameter values.
    pub fn validate(&self) -> Result<()> {
        if self.n_outer_splits < 2 {
            return Err(StrategyError::InvalidConfig(
                "n_outer_splits must be at least 2".to_string(),
            ));
        }
        if self.n_inner_splits == 0 {
            return Err(StrategyError::InvalidConfig(
                "n_inner_splits must be at least 1".to_string(),
            ));
        }
        if self.n_iter == 0 {
            return Err(StrategyError::InvalidConfig(
                "n_iter must be at least 1".to_string(),
            ));
        }
        if self.n_repeats == 0 {
            return Err(StrategyError::InvalidConfig(
                "n_repeats must be at least 1".to_string(),
            ));
        }
        if self.n_jobs == 0 || self.n_jobs < -1 {
            return Err(StrategyError::InvalidConfig(
                "n_jobs must be -1 or a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`StrategyParams`].
#[derive(Debug, Clone, Default)]
pub struct StrategyParamsBuilder {
    params: StrategyParams,
}

impl StrategyParamsBuilder {
    #[must_use]
    pub fn n_outer_splits(mut self, n: u32) -> Self {
        self.params.n_outer_splits = n;
        self
    }

    #[must_use]
    pub fn n_inner_splits(mut self, n: u32) -> Self {
        self.params.n_inner_splits = n;
        self
    }

    #[must_use]
    pub fn n_jobs(mut self, jobs: i32) -> Self {
        self.params.n_jobs = jobs;
        self
    }

    #[must_use]
    pub fn n_iter(mut self, n: u32) -> Self {
        self.params.n_iter = n;
        self
    }

    #[must_use]
    pub fn n_repeats(mut self, n: u32) -> Self {
        self.params.n_repeats = n;
        self
    }

    #[must_use]
    pub fn compute_importance(mut self, enable: bool) -> Self {
        self.params.compute_importance = enable;
        self
    }

    #[must_use]
    pub fn learning_curve(mut self, enable: bool) -> Self {
        self.params.learning_curve = enable;
        self
    }

    /// Build the parameters, validating all values.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::InvalidConfig`] for the conditions listed on
    /// [`StrategyParams::validate`].
    pub fn build(self) -> Result<StrategyParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let params = StrategyParams::default();
        assert_eq!(params.n_outer_splits, 2);
        assert_eq!(params.n_inner_splits, 2);
        assert_eq!(params.n_jobs, 1);
        assert_eq!(params.n_iter, 1);
        assert_eq!(params.n_repeats, 1);
        assert!(!params.compute_importance);
        assert!(!params.learning_curve);
    }

    #[test]
    fn test_yaml_overrides_only_given_fields() {
        let params = StrategyParams::from_yaml_str("n_iter: 50\nlearning_curve: true\n").unwrap();
        assert_eq!(
            params,
            StrategyParams {
                n_iter: 50,
                learning_curve: true,
                ..StrategyParams::default()
            }
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(StrategyParams::from_yaml_str("").unwrap(), StrategyParams::default());
    }

    #[test]
    fn test_invalid_values() {
        assert!(StrategyParams::from_yaml_str("n_outer_splits: 1").is_err());
        assert!(StrategyParams::builder().n_jobs(0).build().is_err());
        assert!(StrategyParams::builder().n_jobs(-1).build().is_ok());
        assert!(matches!(
            StrategyParams::from_yaml_str("n_iter: [1, 2]"),
            Err(StrategyError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let params = StrategyParams::load("/nonexistent/strategy_params.yml").unwrap();
        assert_eq!(params, StrategyParams::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "health_strategies_params_{}.yml",
            std::process::id()
        ));
        std::fs::write(&path, "n_jobs: -1\ncompute_importance: true\n").unwrap();

        let params = StrategyParams::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(params.n_jobs, -1);
        assert!(params.compute_importance);
        assert_eq!(params.n_iter, 1);
    }
}
