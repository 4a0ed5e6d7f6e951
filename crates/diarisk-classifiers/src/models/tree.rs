use std::fmt;

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelFamily, ModelType};
use crate::error::RiskError;
use crate::models::classifier_trait::{check_training_input, ClassifierModel};

/// Growth limits shared by the single tree and the forest members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// Fit a Gini CART tree with `linfa-trees` on 0/1 labels.
pub(crate) fn fit_cart(
    family: ModelFamily,
    x: Array2<f64>,
    y: &[u8],
    params: TreeParams,
) -> Result<DecisionTree<f64, usize>, RiskError> {
    let targets: Array1<usize> = y.iter().map(|&l| l as usize).collect();
    let dataset = Dataset::new(x, targets);
    DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(params.max_depth)
        .min_weight_split(params.min_samples_split as f32)
        .min_weight_leaf(params.min_samples_leaf as f32)
        .fit(&dataset)
        .map_err(|e| RiskError::Training {
            family,
            message: e.to_string(),
        })
}

/// Labels of one fitted tree, as 0/1.
pub(crate) fn tree_labels(tree: &DecisionTree<f64, usize>, x: &Array2<f64>) -> Vec<u8> {
    let labels: Array1<usize> = tree.predict(x);
    labels.iter().map(|&l| (l == 1) as u8).collect()
}

/// Gini CART classifier. Leaves are grown until pure by default, so the
/// probability of a row is the label of its leaf.
#[derive(Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    params: ModelConfig,
    tree: Option<DecisionTree<f64, usize>>,
}

impl fmt::Debug for DecisionTreeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionTreeClassifier")
            .field("params", &self.params)
            .field("fitted", &self.tree.is_some())
            .finish()
    }
}

impl DecisionTreeClassifier {
    pub fn new(params: ModelConfig) -> Self {
        DecisionTreeClassifier { params, tree: None }
    }

    fn fitted(&self) -> Result<&DecisionTree<f64, usize>, RiskError> {
        self.tree
            .as_ref()
            .ok_or(RiskError::NotFitted(ModelFamily::DecisionTree))
    }
}

impl ClassifierModel for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), RiskError> {
        let params = match &self.params.model_type {
            ModelType::DecisionTree {
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => TreeParams {
                max_depth: *max_depth,
                min_samples_split: *min_samples_split,
                min_samples_leaf: *min_samples_leaf,
            },
            other => {
                return Err(RiskError::Training {
                    family: ModelFamily::DecisionTree,
                    message: format!("expected DecisionTree params, got {:?}", other),
                })
            }
        };
        check_training_input(ModelFamily::DecisionTree, x, y)?;

        let tree = fit_cart(ModelFamily::DecisionTree, x.to_owned(), y, params)?;
        log::debug!("Decision tree fitted on {} rows", x.nrows());
        self.tree = Some(tree);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, RiskError> {
        Ok(tree_labels(self.fitted()?, x))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, RiskError> {
        Ok(self.predict(x)?.into_iter().map(f64::from).collect())
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::DecisionTree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tree_config(max_depth: Option<usize>) -> ModelConfig {
        ModelConfig::new(
            42,
            ModelType::DecisionTree {
                max_depth,
                min_samples_split: 2,
                min_samples_leaf: 1,
            },
        )
    }

    #[test]
    fn unlimited_tree_memorises_training_set() {
        let x = array![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0], [0.5, 0.2]];
        let y = [0, 1, 0, 1, 1];
        let mut clf = DecisionTreeClassifier::new(tree_config(None));
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict(&x).unwrap(), y.to_vec());
        assert_eq!(clf.predict_proba(&x).unwrap(), vec![0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn depth_limit_is_respected() {
        // Alternating labels need five splits; one level cannot fit them.
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = [0, 1, 0, 1, 0, 1];
        let mut shallow = DecisionTreeClassifier::new(tree_config(Some(1)));
        shallow.fit(&x, &y).unwrap();
        assert_ne!(shallow.predict(&x).unwrap(), y.to_vec());

        let mut deep = DecisionTreeClassifier::new(tree_config(None));
        deep.fit(&x, &y).unwrap();
        assert_eq!(deep.predict(&x).unwrap(), y.to_vec());
    }

    #[test]
    fn single_class_predicts_that_class() {
        let x = array![[0.0], [1.0]];
        let y = [1, 1];
        let mut clf = DecisionTreeClassifier::new(tree_config(None));
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict_proba(&x).unwrap(), vec![1.0, 1.0]);
    }
}
