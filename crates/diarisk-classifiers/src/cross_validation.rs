//! Stratified k-fold cross-validation on the (already scaled) training
//! partition.
use ndarray::{Array2, Axis};

use crate::config::ModelConfig;
use crate::error::RiskError;
use crate::metrics::accuracy;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::split::stratified_kfold;

/// Per-fold accuracies and their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct CvScores {
    pub fold_accuracy: Vec<f64>,
}

impl CvScores {
    pub fn mean(&self) -> f64 {
        if self.fold_accuracy.is_empty() {
            return 0.0;
        }
        self.fold_accuracy.iter().sum::<f64>() / self.fold_accuracy.len() as f64
    }
}

/// Fit a fresh model from `config` on each fold's training rows and score
/// accuracy on the held-out rows.
pub fn cross_val_accuracy(
    config: &ModelConfig,
    x: &Array2<f64>,
    y: &[u8],
    n_folds: usize,
) -> Result<CvScores, RiskError> {
    let mut fold_accuracy = Vec::with_capacity(n_folds);
    for (fold, indices) in stratified_kfold(y, n_folds)?.into_iter().enumerate() {
        let x_train = x.select(Axis(0), &indices.train);
        let y_train: Vec<u8> = indices.train.iter().map(|&i| y[i]).collect();
        let x_val = x.select(Axis(0), &indices.test);
        let y_val: Vec<u8> = indices.test.iter().map(|&i| y[i]).collect();

        let mut model = build_model(config.clone());
        model.fit(&x_train, &y_train)?;
        let acc = accuracy(&y_val, &model.predict(&x_val)?)?;
        log::trace!("{} fold {}: accuracy {:.4}", config.family(), fold, acc);
        fold_accuracy.push(acc);
    }
    Ok(CvScores { fold_accuracy })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_data_scores_high() {
        let n = 30;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 - 15.0);
        let y: Vec<u8> = (0..n).map(|i| (i >= 15) as u8).collect();
        let scores = cross_val_accuracy(&ModelConfig::default(), &x, &y, 3).unwrap();
        assert_eq!(scores.fold_accuracy.len(), 3);
        assert!(scores.mean() > 0.9);
    }

    #[test]
    fn more_folds_than_class_members_is_rejected() {
        let n = 30;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 - 15.0);
        let y: Vec<u8> = (0..n).map(|i| (i >= 15) as u8).collect();
        assert!(cross_val_accuracy(&ModelConfig::default(), &x, &y, 15).is_ok());
        assert!(matches!(
            cross_val_accuracy(&ModelConfig::default(), &x, &y, 40),
            Err(RiskError::DegenerateSplit { count: 15, .. })
        ));
    }
}
