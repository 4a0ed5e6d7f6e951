use std::fmt;

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelFamily, ModelType};
use crate::error::RiskError;
use crate::models::classifier_trait::{check_training_input, ClassifierModel};

/// L2-regularised logistic regression backed by `linfa-logistic`.
///
/// The penalty is `alpha = 1 / C` on the coefficients; the intercept is not
/// penalised.
#[derive(Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    params: ModelConfig,
    fitted: Option<FittedLogisticRegression<f64, bool>>,
}

impl fmt::Debug for LogisticRegressionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogisticRegressionClassifier")
            .field("params", &self.params)
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl LogisticRegressionClassifier {
    pub fn new(params: ModelConfig) -> Self {
        LogisticRegressionClassifier {
            params,
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&FittedLogisticRegression<f64, bool>, RiskError> {
        self.fitted
            .as_ref()
            .ok_or(RiskError::NotFitted(ModelFamily::LogisticRegression))
    }
}

fn training_error(message: String) -> RiskError {
    RiskError::Training {
        family: ModelFamily::LogisticRegression,
        message,
    }
}

impl ClassifierModel for LogisticRegressionClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        let (c, max_iter, tol) = match &self.params.model_type {
            ModelType::LogisticRegression { c, max_iter, tol } => (*c, *max_iter, *tol),
            other => {
                return Err(training_error(format!(
                    "expected LogisticRegression params, got {:?}",
                    other
                )))
            }
        };
        check_training_input(ModelFamily::LogisticRegression, x, y)?;
        if !(c.is_finite() && c > 0.0) {
            return Err(training_error(format!("C must be positive, got {}", c)));
        }

        let targets: Array1<bool> = y.iter().map(|&l| l == 1).collect();
        let dataset = Dataset::new(x.to_owned(), targets);
        let model = LogisticRegression::default()
            .alpha(1.0 / c)
            .max_iterations(max_iter as u64)
            .gradient_tolerance(tol)
            .fit(&dataset)
            .map_err(|e| training_error(e.to_string()))?;
        log::debug!(
            "Logistic regression fitted on {} rows (alpha {:.4})",
            x.nrows(),
            1.0 / c
        );
        self.fitted = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        let labels: Array1<bool> = self.fitted()?.predict(x);
        Ok(labels.iter().map(|&l| l as u8).collect())
    }

    /// Probability of the diabetic class.
    ///
    /// linfa reports the probability of whichever class it picked as positive
    /// at fit time, so each value is oriented by the label the same model
    /// assigns to that row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        let model = self.fitted()?;
        let labels: Array1<bool> = model.predict(x);
        let proba = model.predict_probabilities(x);
        Ok(labels
            .iter()
            .zip(proba.iter())
            .map(|(&label, &p)| if label == (p >= 0.5) { p } else { 1.0 - p })
            .collect())
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::LogisticRegression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn model() -> LogisticRegressionClassifier {
        LogisticRegressionClassifier::new(ModelConfig::default())
    }

    #[test]
    fn learns_one_dimensional_threshold() {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = [0, 0, 0, 0, 1, 1, 1, 1];
        let mut lr = model();
        lr.fit(&x, &y).unwrap();

        assert_eq!(lr.predict(&x).unwrap(), y.to_vec());
        let proba = lr.predict_proba(&x).unwrap();
        assert!(proba.windows(2).all(|w| w[0] <= w[1]));
        assert!(proba[0] < 0.5 && proba[7] > 0.5);
    }

    #[test]
    fn probability_follows_the_positive_label() {
        // Positives in the majority and listed first.
        let x = array![[2.0], [1.5], [1.0], [0.8], [0.6], [-1.0], [-2.0]];
        let y = [1, 1, 1, 1, 1, 0, 0];
        let mut lr = model();
        lr.fit(&x, &y).unwrap();

        let labels = lr.predict(&x).unwrap();
        let proba = lr.predict_proba(&x).unwrap();
        for (label, p) in labels.iter().zip(&proba) {
            assert_eq!(*label == 1, *p >= 0.5, "label {} with p {}", label, p);
        }
        assert!(proba[0] > proba[6]);
    }

    #[test]
    fn non_positive_c_is_rejected() {
        let x = array![[0.0], [1.0]];
        let mut lr = LogisticRegressionClassifier::new(ModelConfig::new(
            42,
            ModelType::LogisticRegression {
                c: 0.0,
                max_iter: 100,
                tol: 1e-4,
            },
        ));
        assert!(matches!(
            lr.fit(&x, &[0, 1]),
            Err(RiskError::Training { .. })
        ));
    }

    #[test]
    fn unfitted_model_errors() {
        let x = array![[0.0]];
        assert!(matches!(
            model().predict_proba(&x),
            Err(RiskError::NotFitted(ModelFamily::LogisticRegression))
        ));
    }
}
