//! Missing-value imputation and feature standardization.
//!
//! Both transforms are fitted once and then frozen: the same fitted parameters
//! are applied to the training partition, the test partition and every record
//! scored at inference time.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::data_handling::{Feature, N_FEATURES};
use crate::error::RiskError;

/// Median imputer for columns where a zero means "not measured".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    /// Median of the non-zero values, only for columns that impute zeros.
    pub medians: Vec<Option<f64>>,
}

impl Imputer {
    pub fn median(&self, feature: Feature) -> Option<f64> {
        self.medians.get(feature.index()).copied().flatten()
    }
}

/// Fit an `Imputer` from the rows of `x`.
pub fn fit_imputer(x: &Array2<f64>) -> Result<Imputer, RiskError> {
    check_width(x.ncols())?;
    if x.nrows() == 0 {
        return Err(RiskError::EmptyDataset);
    }

    let mut medians = vec![None; N_FEATURES];
    for feature in Feature::ALL.iter().filter(|f| f.zero_is_missing()) {
        let observed: Vec<f64> = x
            .column(feature.index())
            .iter()
            .copied()
            .filter(|v| *v != 0.0)
            .collect();
        if observed.is_empty() {
            return Err(RiskError::NoObservedValues(*feature));
        }
        let median = Data::new(observed).median();
        log::trace!("Median {} = {}", feature, median);
        medians[feature.index()] = Some(median);
    }

    Ok(Imputer { medians })
}

/// Replace missing-marker zeros with the fitted medians.
pub fn impute_all(x: &Array2<f64>, imputer: &Imputer) -> Result<Array2<f64>, RiskError> {
    check_width(x.ncols())?;
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        for (value, median) in row.iter_mut().zip(imputer.medians.iter()) {
            if let Some(m) = median {
                if *value == 0.0 {
                    *value = *m;
                }
            }
        }
    }
    Ok(out)
}

/// Simple standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler, RiskError> {
    if x.nrows() == 0 {
        return Err(RiskError::EmptyDataset);
    }

    let mut mean = Vec::with_capacity(x.ncols());
    let mut std = Vec::with_capacity(x.ncols());
    for column in x.columns() {
        let m = column.iter().mean();
        let s = column.iter().population_std_dev();
        mean.push(m);
        // Constant columns keep their centred value instead of dividing by zero.
        std.push(if s.is_finite() && s > 0.0 { s } else { 1.0 });
    }

    Ok(Scaler { mean, std })
}

/// Standardize all rows with a fitted `Scaler`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>, RiskError> {
    if x.ncols() != sc.mean.len() {
        return Err(RiskError::ShapeMismatch {
            expected: sc.mean.len(),
            found: x.ncols(),
        });
    }
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = (*value - sc.mean[c]) / sc.std[c];
        }
    }
    Ok(out)
}

/// Undo [`transform_all`].
pub fn inverse_transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>, RiskError> {
    if x.ncols() != sc.mean.len() {
        return Err(RiskError::ShapeMismatch {
            expected: sc.mean.len(),
            found: x.ncols(),
        });
    }
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = *value * sc.std[c] + sc.mean[c];
        }
    }
    Ok(out)
}

/// Fit a scaler and return it with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>), RiskError> {
    let sc = fit_scaler(x)?;
    let transformed = transform_all(x, &sc)?;
    Ok((sc, transformed))
}

fn check_width(ncols: usize) -> Result<(), RiskError> {
    if ncols != N_FEATURES {
        return Err(RiskError::ShapeMismatch {
            expected: N_FEATURES,
            found: ncols,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn imputer_uses_median_of_non_zero_values() {
        let x = array![
            [1.0, 0.0, 70.0, 20.0, 0.0, 30.0, 0.5, 40.0],
            [2.0, 100.0, 0.0, 30.0, 80.0, 0.0, 0.4, 41.0],
            [0.0, 120.0, 80.0, 0.0, 100.0, 32.0, 0.3, 42.0],
            [3.0, 140.0, 90.0, 40.0, 0.0, 34.0, 0.2, 43.0],
        ];
        let imp = fit_imputer(&x).unwrap();
        assert_eq!(imp.median(Feature::Glucose), Some(120.0));
        assert_eq!(imp.median(Feature::BloodPressure), Some(80.0));
        assert_eq!(imp.median(Feature::Insulin), Some(90.0));
        assert_eq!(imp.median(Feature::Pregnancies), None);

        let cleaned = impute_all(&x, &imp).unwrap();
        assert_eq!(cleaned[(0, Feature::Glucose.index())], 120.0);
        assert_eq!(cleaned[(0, Feature::Insulin.index())], 90.0);
        // Pregnancies keeps its genuine zero.
        assert_eq!(cleaned[(2, Feature::Pregnancies.index())], 0.0);
    }

    #[test]
    fn imputer_rejects_all_missing_column() {
        let x = Array2::<f64>::zeros((3, N_FEATURES));
        assert!(matches!(
            fit_imputer(&x),
            Err(RiskError::NoObservedValues(Feature::Glucose))
        ));
    }

    #[test]
    fn constant_column_scales_to_zero() {
        let x = array![[5.0, 1.0], [5.0, 3.0]];
        let (sc, t) = fit_transform(&x).unwrap();
        assert_eq!(sc.std[0], 1.0);
        assert_eq!(t[(0, 0)], 0.0);
        assert!((t[(0, 1)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let sc = fit_scaler(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(transform_all(&array![[1.0, 2.0, 3.0]], &sc).is_err());
    }
}
