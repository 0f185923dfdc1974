//! The named table of training strategies.

use crate::config::{StrategyParams, TaskKind};
use crate::error::{Result, StrategyError};
use crate::strategy::{
    CvSplitter, Estimator, ImportanceParams, Imputer, LearningCurveParams, Loss,
    ParamDistribution, Scoring, SearchMethod, SearchParams, Strategy,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Seed shared by every splitter.
pub const RANDOM_STATE: u64 = 42;

const INNER_TRAIN_SIZE: f64 = 0.8;

fn inner_cv(params: &StrategyParams) -> CvSplitter {
    CvSplitter::ShuffleSplit {
        n_splits: params.n_inner_splits,
        train_size: INNER_TRAIN_SIZE,
        random_state: RANDOM_STATE,
    }
}

fn outer_cv(params: &StrategyParams) -> CvSplitter {
    CvSplitter::KFold {
        n_splits: params.n_outer_splits,
        shuffle: true,
        random_state: RANDOM_STATE,
    }
}

fn learning_rate() -> ParamDistribution {
    ParamDistribution::Uniform {
        loc: 1e-5,
        scale: 1.0,
    }
}

/// Gradient-boosting classification tuned for recall.
pub fn classification(params: &StrategyParams) -> Strategy {
    let param_space = BTreeMap::from([
        ("learning_rate".to_string(), learning_rate()),
        (
            "max_iter".to_string(),
            ParamDistribution::IntRange { start: 10, end: 500 },
        ),
    ]);

    Strategy {
        name: "Classification".to_string(),
        task: TaskKind::Classification,
        estimator: Estimator::GradientBoostingClassifier,
        inner_cv: inner_cv(params),
        outer_cv: outer_cv(params),
        param_space,
        search: SearchMethod::Randomized,
        search_params: SearchParams {
            scoring: Scoring::Single("recall".to_string()),
            verbose: 2,
            n_jobs: Some(params.n_jobs),
            return_train_score: true,
            n_iter: params.n_iter,
        },
        compute_importance: params.compute_importance,
        importance_params: ImportanceParams {
            n_jobs: params.n_jobs,
            n_repeats: params.n_repeats,
        },
        learning_curve: params.learning_curve,
        learning_curve_params: LearningCurveParams {
            scoring: "roc_auc_ovr_weighted".to_string(),
            n_jobs: params.n_jobs,
        },
        imputer: None,
    }
}

/// Gradient-boosting regression on absolute deviation, refit on r2.
///
/// The search itself runs single-threaded; `n_jobs` only reaches importance
/// and learning curves.
pub fn regression(params: &StrategyParams) -> Strategy {
    let param_space = BTreeMap::from([
        ("learning_rate".to_string(), learning_rate()),
        (
            "max_depth".to_string(),
            ParamDistribution::IntRange { start: 3, end: 11 },
        ),
    ]);

    Strategy {
        name: "Regression".to_string(),
        task: TaskKind::Regression,
        estimator: Estimator::GradientBoostingRegressor {
            loss: Loss::LeastAbsoluteDeviation,
        },
        inner_cv: inner_cv(params),
        outer_cv: outer_cv(params),
        param_space,
        search: SearchMethod::Randomized,
        search_params: SearchParams {
            scoring: Scoring::Multi {
                metrics: vec!["r2".to_string(), "neg_mean_absolute_error".to_string()],
                refit: "r2".to_string(),
            },
            verbose: 2,
            n_jobs: None,
            return_train_score: true,
            n_iter: params.n_iter,
        },
        compute_importance: params.compute_importance,
        importance_params: ImportanceParams {
            n_jobs: params.n_jobs,
            n_repeats: params.n_repeats,
        },
        learning_curve: params.learning_curve,
        learning_curve_params: LearningCurveParams {
            scoring: "r2".to_string(),
            n_jobs: params.n_jobs,
        },
        imputer: None,
    }
}

/// Build every strategy keyed by name.
///
/// The table holds the two base strategies and, for each [`Imputer`], an
/// imputed copy of both.
pub fn build_strategies(params: &StrategyParams) -> BTreeMap<String, Strategy> {
    let base = [classification(params), regression(params)];

    let imputed: Vec<Strategy> = Imputer::ALL
        .iter()
        .flat_map(|imputer| base.iter().map(move |s| s.with_imputer(*imputer)))
        .collect();

    let strategies: BTreeMap<String, Strategy> = base
        .into_iter()
        .chain(imputed)
        .map(|s| (s.name.clone(), s))
        .collect();

    debug!("Built {} strategies", strategies.len());
    strategies
}

/// Look up a strategy by name.
pub fn strategy<'a>(strategies: &'a BTreeMap<String, Strategy>, name: &str) -> Result<&'a Strategy> {
    strategies
        .get(name)
        .ok_or_else(|| StrategyError::UnknownStrategy {
            name: name.to_string(),
            available: strategies.keys().cloned().collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_has_all_variants() {
        let strategies = build_strategies(&StrategyParams::default());
        assert_eq!(strategies.len(), 14);

        let mut expected = vec!["Classification".to_string(), "Regression".to_string()];
        for imputer in Imputer::ALL {
            for base in ["Classification", "Regression"] {
                expected.push(format!("{}_imputed_{}", base, imputer.label()));
            }
        }
        expected.sort();
        assert_eq!(strategies.keys().cloned().collect::<Vec<_>>(), expected);

        let imputed = &strategies["Regression_imputed_Med+mask"];
        assert_eq!(imputed.imputer, Some(Imputer::MedianMask));
        assert_eq!(imputed.task, TaskKind::Regression);
        assert_eq!(strategies["Classification"].imputer, None);
    }

    #[test]
    fn test_params_flow_into_strategies() {
        let params = StrategyParams::from_yaml_str(
            "n_outer_splits: 5\nn_inner_splits: 3\nn_jobs: -1\nn_iter: 30\ncompute_importance: true\n",
        )
        .unwrap();
        let strategies = build_strategies(&params);

        let clf = &strategies["Classification_imputed_Iterative"];
        assert_eq!(clf.outer_cv.n_splits(), 5);
        assert_eq!(clf.inner_cv.n_splits(), 3);
        assert_eq!(clf.search_params.n_iter, 30);
        assert_eq!(clf.search_params.n_jobs, Some(-1));
        assert_eq!(clf.importance_params.n_jobs, -1);
        assert!(clf.compute_importance);
        assert!(!clf.learning_curve);

        let reg = &strategies["Regression"];
        assert_eq!(reg.search_params.n_jobs, None);
        assert_eq!(reg.learning_curve_params.scoring, "r2");
    }

    #[test]
    fn test_param_spaces() {
        let strategies = build_strategies(&StrategyParams::default());

        let clf = &strategies["Classification"];
        assert_eq!(
            clf.param_space["max_iter"],
            ParamDistribution::IntRange { start: 10, end: 500 }
        );
        assert_eq!(clf.search_params.scoring, Scoring::Single("recall".to_string()));

        let reg = &strategies["Regression"];
        assert_eq!(
            reg.param_space.keys().cloned().collect::<Vec<_>>(),
            vec!["learning_rate", "max_depth"]
        );
        assert_eq!(
            reg.estimator,
            Estimator::GradientBoostingRegressor {
                loss: Loss::LeastAbsoluteDeviation
            }
        );
    }

    #[test]
    fn test_lookup() {
        let strategies = build_strategies(&StrategyParams::default());
        assert!(strategy(&strategies, "Regression").is_ok());
        assert!(matches!(
            strategy(&strategies, "Clustering"),
            Err(StrategyError::UnknownStrategy { available, .. }) if available.len() == 14
        ));
    }

    #[test]
    fn test_strategy_json() {
        let strategies = build_strategies(&StrategyParams::default());
        let json = strategies["Classification_imputed_Mean+mask"].to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "Classification_imputed_Mean+mask");
        assert_eq!(value["imputer"], "mean_mask");
        assert_eq!(value["inner_cv"]["kind"], "shuffle_split");
        assert_eq!(value["inner_cv"]["train_size"], 0.8);
        assert_eq!(value["outer_cv"]["random_state"], 42);

        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strategies["Classification_imputed_Mean+mask"]);
    }
}
