//! The [`Strategy`] configuration object and its parts.
//!
//! A strategy is plain data. The trainer that consumes it decides how each
//! part maps onto an actual estimator, splitter or search implementation.

use crate::config::TaskKind;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Loss minimized by a gradient-boosting regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    LeastSquares,
    LeastAbsoluteDeviation,
}

/// Model to fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Histogram-based gradient-boosting classifier with default settings.
    GradientBoostingClassifier,
    /// Histogram-based gradient-boosting regressor.
    GradientBoostingRegressor { loss: Loss },
}

/// Cross-validation splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CvSplitter {
    /// Independent random train/test splits.
    ShuffleSplit {
        n_splits: u32,
        train_size: f64,
        random_state: u64,
    },
    /// K consecutive folds, optionally shuffled first.
    KFold {
        n_splits: u32,
        shuffle: bool,
        random_state: u64,
    },
}

impl CvSplitter {
    pub fn n_splits(&self) -> u32 {
        match self {
            Self::ShuffleSplit { n_splits, .. } | Self::KFold { n_splits, .. } => *n_splits,
        }
    }
}

/// Distribution a hyperparameter is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamDistribution {
    /// Continuous uniform on `[loc, loc + scale]`.
    Uniform { loc: f64, scale: f64 },
    /// Integers in `[start, end)`.
    IntRange { start: i64, end: i64 },
    /// One of an explicit list of values.
    Choice { values: Vec<serde_json::Value> },
}

impl ParamDistribution {
    /// Whether `value` can be drawn from this distribution.
    pub fn contains(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::Uniform { loc, scale } => value
                .as_f64()
                .is_some_and(|v| v >= *loc && v <= loc + scale),
            Self::IntRange { start, end } => value
                .as_i64()
                .is_some_and(|v| v >= *start && v < *end),
            Self::Choice { values } => values.contains(value),
        }
    }
}

/// Hyperparameter search method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Every combination of a discrete grid.
    Grid,
    /// `n_iter` candidates sampled from the distributions.
    Randomized,
}

/// Metric(s) used to rank search candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scoring {
    Single(String),
    /// Several metrics; the model is refit on `refit`.
    Multi { metrics: Vec<String>, refit: String },
}

/// Settings passed to the search method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub scoring: Scoring,
    pub verbose: u32,
    /// Parallel jobs, when the search runs them itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_jobs: Option<i32>,
    pub return_train_score: bool,
    pub n_iter: u32,
}

/// Settings of permutation feature importance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceParams {
    pub n_jobs: i32,
    pub n_repeats: u32,
}

/// Settings of learning-curve computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningCurveParams {
    pub scoring: String,
    pub n_jobs: i32,
}

/// Preprocessor that fills missing values before the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputer {
    Mean,
    MeanMask,
    Median,
    MedianMask,
    Iterative,
    IterativeMask,
}

impl Imputer {
    /// All imputers, in the order their strategy variants are built.
    pub const ALL: [Imputer; 6] = [
        Self::Mean,
        Self::MeanMask,
        Self::Median,
        Self::MedianMask,
        Self::Iterative,
        Self::IterativeMask,
    ];

    /// Short label used in strategy names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::MeanMask => "Mean+mask",
            Self::Median => "Med",
            Self::MedianMask => "Med+mask",
            Self::Iterative => "Iterative",
            Self::IterativeMask => "Iterative+mask",
        }
    }

    /// Whether a missing-indicator column is appended per imputed feature.
    pub fn add_indicator(&self) -> bool {
        matches!(self, Self::MeanMask | Self::MedianMask | Self::IterativeMask)
    }
}

/// A named bundle of model, search and evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub task: TaskKind,
    pub estimator: Estimator,
    /// Splitter of the hyperparameter search.
    pub inner_cv: CvSplitter,
    /// Splitter of the evaluation loop around the search.
    pub outer_cv: CvSplitter,
    pub param_space: BTreeMap<String, ParamDistribution>,
    pub search: SearchMethod,
    pub search_params: SearchParams,
    pub compute_importance: bool,
    pub importance_params: ImportanceParams,
    pub learning_curve: bool,
    pub learning_curve_params: LearningCurveParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputer: Option<Imputer>,
}

impl Strategy {
    /// Copy of this strategy preceded by `imputer`, named `{name}_imputed_{label}`.
    #[must_use]
    pub fn with_imputer(&self, imputer: Imputer) -> Self {
        let mut strategy = self.clone();
        strategy.name = format!("{}_imputed_{}", self.name, imputer.label());
        strategy.imputer = Some(imputer);
        strategy
    }

    /// JSON form handed to the trainer.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_distribution_contains() {
        let lr = ParamDistribution::Uniform { loc: 1e-5, scale: 1.0 };
        assert!(lr.contains(&json!(0.5)));
        assert!(!lr.contains(&json!(0.0)));

        let depth = ParamDistribution::IntRange { start: 3, end: 11 };
        assert!(depth.contains(&json!(10)));
        assert!(!depth.contains(&json!(11)));
        assert!(!depth.contains(&json!("deep")));

        let choice = ParamDistribution::Choice {
            values: vec![json!("a"), json!(1)],
        };
        assert!(choice.contains(&json!(1)));
        assert!(!choice.contains(&json!("b")));
    }

    #[test]
    fn test_imputer_labels() {
        let labels: Vec<&str> = Imputer::ALL.iter().map(Imputer::label).collect();
        assert_eq!(
            labels,
            vec!["Mean", "Mean+mask", "Med", "Med+mask", "Iterative", "Iterative+mask"]
        );
        assert!(Imputer::MedianMask.add_indicator());
        assert!(!Imputer::Iterative.add_indicator());
    }

    #[test]
    fn test_scoring_serialization() {
        let single = serde_json::to_value(Scoring::Single("recall".to_string())).unwrap();
        assert_eq!(single, json!("recall"));

        let multi = serde_json::to_value(Scoring::Multi {
            metrics: vec!["r2".to_string(), "neg_mean_absolute_error".to_string()],
            refit: "r2".to_string(),
        })
        .unwrap();
        assert_eq!(multi["refit"], json!("r2"));
    }

    #[test]
    fn test_splitter_tagging() {
        let cv = CvSplitter::KFold {
            n_splits: 5,
            shuffle: true,
            random_state: 42,
        };
        let value = serde_json::to_value(&cv).unwrap();
        assert_eq!(value["kind"], json!("k_fold"));
        assert_eq!(cv.n_splits(), 5);
    }
}
