//! Binary classification metrics.
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Confusion counts with label 1 as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Result<Self, RiskError> {
        if y_true.len() != y_pred.len() {
            return Err(RiskError::ShapeMismatch {
                expected: y_true.len(),
                found: y_pred.len(),
            });
        }
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == 1, p == 1) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// 0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// 0 when there are no positive labels.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Held-out scores for one candidate in one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Mean cross-validated accuracy on the training partition.
    pub cv_score: f64,
}

impl EvaluationResult {
    pub fn new(cm: &ConfusionMatrix, cv_score: f64) -> Self {
        EvaluationResult {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1(),
            cv_score,
        }
    }
}

pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> Result<f64, RiskError> {
    Ok(ConfusionMatrix::from_labels(y_true, y_pred)?.accuracy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_counts() {
        let y_true = [1, 1, 1, 0, 0, 0, 0, 1];
        let y_pred = [1, 0, 1, 0, 1, 0, 0, 1];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();
        assert_eq!(cm.true_positive, 3);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.true_negative, 3);
        assert!((cm.accuracy() - 0.75).abs() < 1e-12);
        assert!((cm.precision() - 0.75).abs() < 1e-12);
        assert!((cm.recall() - 0.75).abs() < 1e-12);
        assert!((cm.f1() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_denominators_give_zero() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
        assert_eq!(cm.accuracy(), 1.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1]),
            Err(RiskError::ShapeMismatch {
                expected: 3,
                found: 2
            })
        ));
        assert!(accuracy(&[1], &[]).is_err());
    }
}
