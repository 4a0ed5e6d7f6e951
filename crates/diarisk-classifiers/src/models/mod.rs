pub mod classifier_trait;
pub mod factory;
pub mod forest;
pub mod gbdt;
pub mod logistic;
pub mod svm;
pub mod tree;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::ModelFamily;
use crate::error::RiskError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::forest::RandomForestClassifier;
use crate::models::gbdt::GradientBoostingClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::svm::SvmClassifier;
use crate::models::tree::DecisionTreeClassifier;

/// Any candidate classifier, in a form that can be persisted in a bundle.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "family", content = "model", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticRegressionClassifier),
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
    GradientBoosting(GradientBoostingClassifier),
    Svm(SvmClassifier),
}

impl Classifier {
    fn inner(&self) -> &dyn ClassifierModel {
        match self {
            Classifier::LogisticRegression(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::RandomForest(m) => m,
            Classifier::GradientBoosting(m) => m,
            Classifier::Svm(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ClassifierModel {
        match self {
            Classifier::LogisticRegression(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::RandomForest(m) => m,
            Classifier::GradientBoosting(m) => m,
            Classifier::Svm(m) => m,
        }
    }
}

impl ClassifierModel for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        self.inner().predict(x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        self.inner().predict_proba(x)
    }

    fn supports_proba(&self) -> bool {
        self.inner().supports_proba()
    }

    fn family(&self) -> ModelFamily {
        self.inner().family()
    }
}
