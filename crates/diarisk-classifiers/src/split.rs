//! Label-stratified train/test partitioning and cross-validation folds.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::RiskError;

/// Row indices of the two partitions, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition row indices so both sides keep the class balance of `y`.
///
/// Each class is shuffled with a `StdRng` seeded from `seed`; the leading
/// members of the permutation go to training and the trailing
/// `round(n_class * test_fraction)` to test, as scikit-learn's
/// `StratifiedShuffleSplit` assigns them. Fails when a class is missing or
/// would end up on only one side.
pub fn stratified_split(
    y: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, RiskError> {
    if y.is_empty() {
        return Err(RiskError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();

    for label in [0u8, 1u8] {
        let mut members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == label).collect();
        let n_test = (members.len() as f64 * test_fraction).round() as usize;
        if n_test == 0 || n_test >= members.len() {
            return Err(RiskError::DegenerateSplit {
                label,
                count: members.len(),
            });
        }
        members.shuffle(&mut rng);
        let (train_part, test_part) = members.split_at(members.len() - n_test);
        train.extend_from_slice(train_part);
        test.extend_from_slice(test_part);
    }

    train.sort_unstable();
    test.sort_unstable();
    log::debug!(
        "Stratified split: {} train rows, {} test rows",
        train.len(),
        test.len()
    );
    Ok(SplitIndices { train, test })
}

/// Deterministic stratified k-fold assignment (no shuffling).
///
/// Members of each class are dealt round-robin across the folds in dataset
/// order, so every fold sees close to the overall class ratio. Every class
/// needs at least `n_folds` members, otherwise some validation folds would
/// miss it.
pub fn stratified_kfold(y: &[u8], n_folds: usize) -> Result<Vec<SplitIndices>, RiskError> {
    if y.is_empty() {
        return Err(RiskError::EmptyDataset);
    }
    let n_folds = n_folds.max(2);
    let mut fold_of = vec![0usize; y.len()];
    for label in [0u8, 1u8] {
        let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == label).collect();
        if members.len() < n_folds {
            return Err(RiskError::DegenerateSplit {
                label,
                count: members.len(),
            });
        }
        for (position, i) in members.into_iter().enumerate() {
            fold_of[i] = position % n_folds;
        }
    }

    Ok((0..n_folds)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&i| fold_of[i] == fold);
            SplitIndices { train, test }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_member_class_is_degenerate() {
        let y = vec![0, 0, 0, 0, 1];
        assert!(matches!(
            stratified_split(&y, 0.2, 42),
            Err(RiskError::DegenerateSplit { label: 1, count: 1 })
        ));
    }

    #[test]
    fn missing_class_is_degenerate() {
        let y = vec![0u8; 10];
        assert!(matches!(
            stratified_split(&y, 0.2, 42),
            Err(RiskError::DegenerateSplit { label: 1, count: 0 })
        ));
    }

    #[test]
    fn kfold_covers_every_row_once() {
        let y: Vec<u8> = (0..23).map(|i| (i % 3 == 0) as u8).collect();
        let folds = stratified_kfold(&y, 5).unwrap();
        assert_eq!(folds.len(), 5);
        let mut seen = vec![0usize; y.len()];
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), y.len());
            for &i in &fold.test {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn kfold_needs_every_class_in_every_fold() {
        let y: Vec<u8> = (0..12).map(|i| (i < 3) as u8).collect();
        assert!(stratified_kfold(&y, 3).is_ok());
        assert!(matches!(
            stratified_kfold(&y, 4),
            Err(RiskError::DegenerateSplit { label: 1, count: 3 })
        ));
    }

    #[test]
    fn test_side_takes_the_tail_of_each_permutation() {
        let y: Vec<u8> = (0..20).map(|i| (i % 4 == 0) as u8).collect();
        let split = stratified_split(&y, 0.2, 42).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut expected_test = Vec::new();
        for label in [0u8, 1u8] {
            let mut members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == label).collect();
            let n_test = (members.len() as f64 * 0.2).round() as usize;
            members.shuffle(&mut rng);
            expected_test.extend_from_slice(&members[members.len() - n_test..]);
        }
        expected_test.sort_unstable();
        assert_eq!(split.test, expected_test);
    }
}
