use ndarray::Array2;

use crate::config::ModelFamily;
use crate::error::RiskError;

/// Contract shared by every candidate family. Labels use 0/1 with 1 as the
/// positive (diabetic) class; inputs are already imputed and standardized.
pub trait ClassifierModel: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError>;

    /// Class labels from the family's own decision rule.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError>;

    /// Positive-class probabilities in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError>;

    /// Whether `predict_proba` is available. Candidates without it cannot be
    /// selected for serving.
    fn supports_proba(&self) -> bool {
        true
    }

    fn family(&self) -> ModelFamily;

    fn name(&self) -> &str {
        self.family().display_name()
    }
}

/// Shape checks shared by every `fit`.
pub(crate) fn check_training_input(
    family: ModelFamily,
    x: &Array2<f64>,
    y: &[u8],
) -> Result<(), RiskError> {
    if x.nrows() == 0 {
        return Err(RiskError::EmptyDataset);
    }
    if x.nrows() != y.len() {
        return Err(RiskError::Training {
            family,
            message: format!("{} rows but {} labels", x.nrows(), y.len()),
        });
    }
    Ok(())
}
