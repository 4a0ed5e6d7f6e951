use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelFamily, ModelType};
use crate::error::RiskError;
use crate::models::classifier_trait::{check_training_input, ClassifierModel};

/// Gradient Boosting Decision Tree (GBDT) classifier
///
/// The log-likelihood loss of `gbdt` expects labels in {-1, 1} and returns
/// positive-class probabilities from `predict`.
#[derive(Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: ModelConfig,
    model: Option<GBDT>,
}

impl fmt::Debug for GradientBoostingClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientBoostingClassifier")
            .field("params", &self.params)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl GradientBoostingClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GradientBoostingClassifier {
            model: None,
            params,
        }
    }
}

fn to_data_vec(x: &Array2<f64>, labels: Option<&[u8]>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for (i, row) in x.rows().into_iter().enumerate() {
        let features: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let label = match labels {
            Some(y) if y[i] == 1 => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        };
        data.push(Data::new_training_data(features, 1.0, label, None));
    }
    data
}

impl ClassifierModel for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        match &self.params.model_type {
            ModelType::GradientBoosting {
                num_boost_round,
                learning_rate,
                max_depth,
                min_leaf_size,
                training_optimization_level,
                loss_type,
            } => {
                check_training_input(ModelFamily::GradientBoosting, x, y)?;

                let mut config = Config::new();
                config.set_feature_size(x.ncols());
                config.set_shrinkage(*learning_rate);
                config.set_max_depth(*max_depth);
                config.set_min_leaf_size(*min_leaf_size);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(false);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);
                let mut train_x = to_data_vec(x, Some(y));
                gbdt.fit(&mut train_x);
                log::debug!(
                    "Gradient boosting fitted: {} rounds, depth {}",
                    num_boost_round,
                    max_depth
                );

                self.model = Some(gbdt);
                Ok(())
            }
            other => Err(RiskError::Training {
                family: ModelFamily::GradientBoosting,
                message: format!("expected GradientBoosting params, got {:?}", other),
            }),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| (p > 0.5) as u8)
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        let model = self
            .model
            .as_ref()
            .ok_or(RiskError::NotFitted(ModelFamily::GradientBoosting))?;
        let test_x = to_data_vec(x, None);
        Ok(model.predict(&test_x).into_iter().map(f64::from).collect())
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::GradientBoosting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbdt_classifier() {
        // Label follows the sign of the second feature.
        let x = Array2::from_shape_vec(
            (10, 3),
            vec![
                0.1, 1.0, 0.2, 0.4, -1.0, 0.8, 0.6, 1.0, 1.2, 0.9, -1.0, 1.8, 1.2, 1.0, 2.4, 1.5,
                -1.0, 3.0, 1.8, 1.0, 3.6, 2.1, -1.0, 4.2, 2.4, 1.0, 4.8, 2.7, -1.0, 5.4,
            ],
        )
        .unwrap();
        let y: Vec<u8> = vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0];

        let params = ModelConfig::new(42, "gbdt".parse().unwrap());
        let mut classifier = GradientBoostingClassifier::new(params);
        classifier.fit(&x, &y).unwrap();

        let proba = classifier.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), y.len());
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(classifier.predict(&x).unwrap(), y);
    }

    #[test]
    fn unfitted_model_errors() {
        let classifier = GradientBoostingClassifier::new(ModelConfig::new(42, "gbdt".parse().unwrap()));
        assert!(classifier.predict(&Array2::zeros((1, 3))).is_err());
    }
}
