use std::fmt;

use linfa_trees::DecisionTree;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelFamily, ModelType};
use crate::error::RiskError;
use crate::models::classifier_trait::{check_training_input, ClassifierModel};
use crate::models::tree::{fit_cart, tree_labels, TreeParams};

/// One bagged tree and the feature columns it was grown on.
#[derive(Serialize, Deserialize)]
struct ForestMember {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

impl ForestMember {
    fn labels(&self, x: &Array2<f64>) -> Vec<u8> {
        tree_labels(&self.tree, &x.select(Axis(1), &self.features))
    }
}

/// Bagged ensemble of `linfa-trees` CART trees on random feature subspaces.
///
/// Tree `i` draws its bootstrap rows and feature subset from
/// `StdRng::seed_from_u64(random_state + i)`, so the fitted forest does not
/// depend on how rayon schedules the trees.
#[derive(Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ModelConfig,
    members: Vec<ForestMember>,
}

impl fmt::Debug for RandomForestClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForestClassifier")
            .field("params", &self.params)
            .field("n_trees", &self.members.len())
            .finish()
    }
}

impl RandomForestClassifier {
    pub fn new(params: ModelConfig) -> Self {
        RandomForestClassifier {
            params,
            members: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }
}

/// `ceil(sqrt(n_features))`, at least one.
fn default_max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features.max(1))
}

fn grow_member(
    x: &Array2<f64>,
    y: &[u8],
    n_features: usize,
    params: TreeParams,
    rng: &mut StdRng,
) -> Result<ForestMember, RiskError> {
    let n = x.nrows();
    let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    let mut features = sample(rng, x.ncols(), n_features).into_vec();
    features.sort_unstable();

    let x_boot = x.select(Axis(0), &rows).select(Axis(1), &features);
    let y_boot: Vec<u8> = rows.iter().map(|&i| y[i]).collect();
    let tree = fit_cart(ModelFamily::RandomForest, x_boot, &y_boot, params)?;
    Ok(ForestMember { features, tree })
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        let (n_estimators, max_features, tree_params) = match &self.params.model_type {
            ModelType::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
                min_samples_leaf,
                max_features,
            } => (
                *n_estimators,
                *max_features,
                TreeParams {
                    max_depth: *max_depth,
                    min_samples_split: *min_samples_split,
                    min_samples_leaf: *min_samples_leaf,
                },
            ),
            other => {
                return Err(RiskError::Training {
                    family: ModelFamily::RandomForest,
                    message: format!("expected RandomForest params, got {:?}", other),
                })
            }
        };
        check_training_input(ModelFamily::RandomForest, x, y)?;
        if n_estimators == 0 {
            return Err(RiskError::Training {
                family: ModelFamily::RandomForest,
                message: "n_estimators must be at least 1".to_string(),
            });
        }
        let n_features = max_features
            .unwrap_or_else(|| default_max_features(x.ncols()))
            .clamp(1, x.ncols().max(1));

        let seed = self.params.random_state;
        self.members = (0..n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                grow_member(x, y, n_features, tree_params, &mut rng)
            })
            .collect::<Result<Vec<_>, RiskError>>()?;

        log::debug!(
            "Random forest grown: {} trees on {} of {} features each",
            self.members.len(),
            n_features,
            x.ncols()
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| (p > 0.5) as u8)
            .collect())
    }

    /// Share of trees voting for the positive class.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        if self.members.is_empty() {
            return Err(RiskError::NotFitted(ModelFamily::RandomForest));
        }
        let mut votes = vec![0usize; x.nrows()];
        for member in &self.members {
            for (v, label) in votes.iter_mut().zip(member.labels(x)) {
                *v += label as usize;
            }
        }
        let n_trees = self.members.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::RandomForest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn forest(n_estimators: usize, seed: u64) -> RandomForestClassifier {
        RandomForestClassifier::new(ModelConfig::new(
            seed,
            ModelType::RandomForest {
                n_estimators,
                max_depth: None,
                min_samples_split: 2,
                min_samples_leaf: 1,
                max_features: None,
            },
        ))
    }

    fn toy_data() -> (Array2<f64>, Vec<u8>) {
        let rows = 40;
        let x = Array2::from_shape_fn((rows, 4), |(i, j)| {
            let base = if i % 2 == 0 { -1.0 } else { 1.0 };
            base * (j as f64 + 1.0) + ((i * 7 + j * 3) % 5) as f64 * 0.1
        });
        let y = (0..rows).map(|i| (i % 2) as u8).collect();
        (x, y)
    }

    #[test]
    fn seeded_forest_is_reproducible() {
        let (x, y) = toy_data();
        let mut a = forest(15, 7);
        let mut b = forest(15, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.n_trees(), 15);
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn separable_data_is_learned() {
        let (x, y) = toy_data();
        let mut clf = forest(25, 42);
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict(&x).unwrap(), y);
    }

    #[test]
    fn sqrt_feature_default() {
        assert_eq!(default_max_features(8), 3);
        assert_eq!(default_max_features(1), 1);
        assert_eq!(default_max_features(9), 3);
    }

    #[test]
    fn members_remember_their_features() {
        let (x, y) = toy_data();
        let mut clf = forest(5, 3);
        clf.fit(&x, &y).unwrap();
        for member in &clf.members {
            assert_eq!(member.features.len(), 2);
            assert!(member.features.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
