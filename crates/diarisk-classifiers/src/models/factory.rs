use crate::config::{ModelConfig, ModelType};
use crate::models::forest::RandomForestClassifier;
use crate::models::gbdt::GradientBoostingClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::svm::SvmClassifier;
use crate::models::tree::DecisionTreeClassifier;
use crate::models::Classifier;

/// Build an unfitted classifier from a `ModelConfig`.
/// Currently this is a thin factory implemented as a single function.
pub fn build_model(params: ModelConfig) -> Classifier {
    match params.model_type {
        ModelType::LogisticRegression { .. } => {
            Classifier::LogisticRegression(LogisticRegressionClassifier::new(params))
        }
        ModelType::DecisionTree { .. } => {
            Classifier::DecisionTree(DecisionTreeClassifier::new(params))
        }
        ModelType::RandomForest { .. } => {
            Classifier::RandomForest(RandomForestClassifier::new(params))
        }
        ModelType::GradientBoosting { .. } => {
            Classifier::GradientBoosting(GradientBoostingClassifier::new(params))
        }
        ModelType::Svm { .. } => Classifier::Svm(SvmClassifier::new(params)),
    }
}
