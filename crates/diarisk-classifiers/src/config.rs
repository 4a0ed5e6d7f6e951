use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

/// Seed shared by every candidate and by the stratified split.
pub const DEFAULT_SEED: u64 = 42;

/// Model family, used for naming, logging and eligibility checks.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LogisticRegression,
    DecisionTree,
    RandomForest,
    GradientBoosting,
    Svm,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 5] = [
        ModelFamily::LogisticRegression,
        ModelFamily::DecisionTree,
        ModelFamily::RandomForest,
        ModelFamily::GradientBoosting,
        ModelFamily::Svm,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ModelFamily::LogisticRegression => "Logistic Regression",
            ModelFamily::DecisionTree => "Decision Tree",
            ModelFamily::RandomForest => "Random Forest",
            ModelFamily::GradientBoosting => "Gradient Boosting",
            ModelFamily::Svm => "SVM",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Central configuration for one candidate model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub random_state: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    LogisticRegression {
        /// Inverse L2 regularisation strength.
        c: f64,
        max_iter: usize,
        /// Gradient-norm stopping tolerance.
        tol: f64,
    },
    DecisionTree {
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        /// Features drawn for each tree; `None` means ceil(sqrt(n_features)).
        max_features: Option<usize>,
    },
    GradientBoosting {
        num_boost_round: u32,
        learning_rate: f32,
        max_depth: u32,
        min_leaf_size: usize,
        training_optimization_level: u8,
        loss_type: String,
    },
    Svm {
        c: f64,
        /// Gaussian kernel width; `None` uses n_features * Var(x).
        gaussian_kernel_eps: Option<f64>,
        eps: f64,
        /// Fit a Platt-calibrated model alongside the decision model.
        probability: bool,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::LogisticRegression {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl ModelType {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelType::LogisticRegression { .. } => ModelFamily::LogisticRegression,
            ModelType::DecisionTree { .. } => ModelFamily::DecisionTree,
            ModelType::RandomForest { .. } => ModelFamily::RandomForest,
            ModelType::GradientBoosting { .. } => ModelFamily::GradientBoosting,
            ModelType::Svm { .. } => ModelFamily::Svm,
        }
    }
}

impl ModelType {
    /// Library-default hyper-parameters for a family.
    pub fn defaults(family: ModelFamily) -> ModelType {
        match family {
            ModelFamily::LogisticRegression => ModelType::default(),
            ModelFamily::DecisionTree => ModelType::DecisionTree {
                max_depth: None,
                min_samples_split: 2,
                min_samples_leaf: 1,
            },
            ModelFamily::RandomForest => ModelType::RandomForest {
                n_estimators: 100,
                max_depth: None,
                min_samples_split: 2,
                min_samples_leaf: 1,
                max_features: None,
            },
            ModelFamily::GradientBoosting => ModelType::GradientBoosting {
                num_boost_round: 100,
                learning_rate: 0.1,
                max_depth: 3,
                min_leaf_size: 1,
                training_optimization_level: 2,
                loss_type: "LogLikelyhood".to_string(),
            },
            ModelFamily::Svm => ModelType::Svm {
                c: 1.0,
                gaussian_kernel_eps: None,
                eps: 1e-3,
                probability: true,
            },
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let family = match s.to_lowercase().replace('-', "_").as_str() {
            "logistic_regression" | "logistic" | "lr" => ModelFamily::LogisticRegression,
            "decision_tree" | "tree" => ModelFamily::DecisionTree,
            "random_forest" | "forest" => ModelFamily::RandomForest,
            "gradient_boosting" | "gbdt" => ModelFamily::GradientBoosting,
            "svm" => ModelFamily::Svm,
            _ => {
                return Err(format!(
                    "Unknown model type: {}. Valid options are: logistic_regression, decision_tree, random_forest, gradient_boosting, svm",
                    s
                ))
            }
        };
        Ok(ModelType::defaults(family))
    }
}

impl ModelConfig {
    pub fn new(random_state: u64, model_type: ModelType) -> Self {
        Self {
            random_state,
            model_type,
        }
    }

    pub fn family(&self) -> ModelFamily {
        self.model_type.family()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            random_state: DEFAULT_SEED,
            model_type: ModelType::default(),
        }
    }
}

/// The five candidate families in evaluation order. Order matters: ties on
/// F1 go to the earlier candidate.
pub fn default_candidates() -> Vec<ModelConfig> {
    ModelFamily::ALL
        .iter()
        .map(|family| ModelConfig::new(DEFAULT_SEED, ModelType::defaults(*family)))
        .collect()
}

/// Which records contribute to the imputation medians.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationScope {
    /// Medians over every record before splitting. Test rows leak into the
    /// medians; kept as the default for parity with published results.
    #[default]
    FullDataset,
    TrainingPartition,
}

/// Parameters for one training run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// CSV dataset; the embedded sample is used when unset.
    pub data: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    /// Cross-validation folds; chosen from the training size when unset.
    pub cv_folds: Option<usize>,
    pub imputation: ImputationScope,
    pub candidates: Vec<ModelConfig>,
    pub write_report: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data: None,
            output_dir: PathBuf::from("model"),
            test_fraction: 0.2,
            seed: DEFAULT_SEED,
            cv_folds: None,
            imputation: ImputationScope::default(),
            candidates: default_candidates(),
            write_report: true,
        }
    }
}

impl TrainingConfig {
    /// Folds used for the cross-validation stability check.
    pub fn resolve_cv_folds(&self, n_train: usize) -> usize {
        self.cv_folds
            .unwrap_or(if n_train >= 200 { 5 } else { 3 })
            .max(2)
    }
}

/// Load a training configuration from a JSON file.
pub fn load_training_config<P: AsRef<Path>>(path: P) -> Result<TrainingConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainingConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
