use std::fmt;

use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::{ModelConfig, ModelFamily, ModelType};
use crate::error::RiskError;
use crate::models::classifier_trait::{check_training_input, ClassifierModel};

/// RBF support-vector classifier.
///
/// Labels come from the decision function of a plain SVM. When `probability`
/// is enabled a second SVM with Platt scaling is fitted on the same data and
/// serves `predict_proba`.
#[derive(Serialize, Deserialize)]
pub struct SvmClassifier {
    params: ModelConfig,
    decision: Option<Svm<f64, bool>>,
    calibrated: Option<Svm<f64, Pr>>,
}

impl fmt::Debug for SvmClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvmClassifier")
            .field("params", &self.params)
            .field("fitted", &self.decision.is_some())
            .field("calibrated", &self.calibrated.is_some())
            .finish()
    }
}

impl SvmClassifier {
    pub fn new(params: ModelConfig) -> Self {
        SvmClassifier {
            params,
            decision: None,
            calibrated: None,
        }
    }

    fn wants_probability(&self) -> bool {
        matches!(
            self.params.model_type,
            ModelType::Svm {
                probability: true,
                ..
            }
        )
    }
}

/// Kernel width equivalent to `gamma = 1 / (n_features * Var(x))`.
fn scale_kernel_eps(x: &Array2<f64>) -> f64 {
    let variance = x.iter().population_variance();
    let eps = x.ncols() as f64 * variance;
    if eps.is_finite() && eps > 0.0 {
        eps
    } else {
        1.0
    }
}

fn training_error(err: linfa_svm::SvmError) -> RiskError {
    RiskError::Training {
        family: ModelFamily::Svm,
        message: err.to_string(),
    }
}

impl ClassifierModel for SvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        let (c, kernel_eps, eps, probability) = match &self.params.model_type {
            ModelType::Svm {
                c,
                gaussian_kernel_eps,
                eps,
                probability,
            } => (*c, *gaussian_kernel_eps, *eps, *probability),
            other => {
                return Err(RiskError::Training {
                    family: ModelFamily::Svm,
                    message: format!("expected Svm params, got {:?}", other),
                })
            }
        };
        check_training_input(ModelFamily::Svm, x, y)?;

        let kernel_eps = kernel_eps.unwrap_or_else(|| scale_kernel_eps(x));
        let targets: Array1<bool> = y.iter().map(|&l| l == 1).collect();
        let dataset = Dataset::new(x.to_owned(), targets);

        let decision = Svm::<f64, bool>::params()
            .pos_neg_weights(c, c)
            .gaussian_kernel(kernel_eps)
            .eps(eps)
            .fit(&dataset)
            .map_err(training_error)?;
        log::debug!(
            "SVM fitted with {} support vectors (kernel eps {:.3})",
            decision.nsupport(),
            kernel_eps
        );

        self.calibrated = if probability {
            Some(
                Svm::<f64, Pr>::params()
                    .pos_neg_weights(c, c)
                    .gaussian_kernel(kernel_eps)
                    .eps(eps)
                    .fit(&dataset)
                    .map_err(training_error)?,
            )
        } else {
            None
        };
        self.decision = Some(decision);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        let svm = self
            .decision
            .as_ref()
            .ok_or(RiskError::NotFitted(ModelFamily::Svm))?;
        let labels: Array1<bool> = svm.predict(x);
        Ok(labels.iter().map(|&l| l as u8).collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        if self.decision.is_none() {
            return Err(RiskError::NotFitted(ModelFamily::Svm));
        }
        let svm = self
            .calibrated
            .as_ref()
            .ok_or(RiskError::ProbabilityUnsupported(ModelFamily::Svm))?;
        let proba: Array1<Pr> = svm.predict(x);
        Ok(proba.iter().map(|p| f64::from(**p)).collect())
    }

    fn supports_proba(&self) -> bool {
        self.wants_probability()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Svm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svm_config(probability: bool) -> ModelConfig {
        ModelConfig::new(
            42,
            ModelType::Svm {
                c: 1.0,
                gaussian_kernel_eps: None,
                eps: 1e-3,
                probability,
            },
        )
    }

    fn two_blobs() -> (Array2<f64>, Vec<u8>) {
        let n = 20;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let centre = if i < n / 2 { -2.0 } else { 2.0 };
            centre + ((i * 3 + j * 5) % 7) as f64 * 0.1
        });
        let y = (0..n).map(|i| (i >= n / 2) as u8).collect();
        (x, y)
    }

    #[test]
    fn test_svm_classifier() {
        let (x, y) = two_blobs();
        let mut clf = SvmClassifier::new(svm_config(true));
        assert!(clf.supports_proba());
        clf.fit(&x, &y).unwrap();

        assert_eq!(clf.predict(&x).unwrap(), y);
        let proba = clf.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

        let mean_neg: f64 = proba[..10].iter().sum::<f64>() / 10.0;
        let mean_pos: f64 = proba[10..].iter().sum::<f64>() / 10.0;
        assert!(mean_pos > mean_neg);
    }

    #[test]
    fn probability_disabled_is_reported() {
        let (x, y) = two_blobs();
        let mut clf = SvmClassifier::new(svm_config(false));
        assert!(!clf.supports_proba());
        clf.fit(&x, &y).unwrap();
        assert!(clf.predict(&x).is_ok());
        assert!(matches!(
            clf.predict_proba(&x),
            Err(RiskError::ProbabilityUnsupported(ModelFamily::Svm))
        ));
    }

    #[test]
    fn scale_width_of_constant_input_falls_back() {
        assert_eq!(scale_kernel_eps(&Array2::from_elem((3, 2), 1.0)), 1.0);
    }
}
