use diarisk_classifiers::config::{ImputationScope, TrainingConfig};
use diarisk_classifiers::data_handling::N_FEATURES;
use diarisk_classifiers::io::sample_dataset;
use diarisk_classifiers::preprocessing::{fit_imputer, fit_scaler, impute_all, inverse_transform_all, transform_all};
use diarisk_classifiers::split::stratified_split;
use diarisk_classifiers::trainer::prepare_data;
use diarisk_classifiers::Feature;
use ndarray::Axis;

/* ------------------------------------------------------------------ */
/* Imputation                                                         */
/* ------------------------------------------------------------------ */

#[test]
fn imputation_replaces_only_missing_markers() {
    let (x, _) = sample_dataset().unwrap().to_arrays().unwrap();
    let imputer = fit_imputer(&x).unwrap();
    let cleaned = impute_all(&x, &imputer).unwrap();

    for feature in Feature::ALL {
        let col = feature.index();
        for (raw, clean) in x.column(col).iter().zip(cleaned.column(col)) {
            if feature.zero_is_missing() && *raw == 0.0 {
                assert_eq!(*clean, imputer.median(feature).unwrap(), "{}", feature);
            } else {
                assert_eq!(clean, raw, "{}", feature);
            }
        }
        if feature.zero_is_missing() {
            assert!(cleaned.column(col).iter().all(|v| *v != 0.0), "{}", feature);
        }
    }
}

#[test]
fn imputation_scope_changes_the_medians_source() {
    let dataset = sample_dataset().unwrap();
    let config = TrainingConfig::default();
    let full = prepare_data(&dataset, config.test_fraction, config.seed, ImputationScope::FullDataset).unwrap();
    let train_only =
        prepare_data(&dataset, config.test_fraction, config.seed, ImputationScope::TrainingPartition).unwrap();

    let (x, _) = dataset.to_arrays().unwrap();
    assert_eq!(full.imputer, fit_imputer(&x).unwrap());
    let x_train = x.select(Axis(0), &train_only.split.train);
    assert_eq!(train_only.imputer, fit_imputer(&x_train).unwrap());
    assert_eq!(full.split, train_only.split);
}

/* ------------------------------------------------------------------ */
/* Split                                                              */
/* ------------------------------------------------------------------ */

#[test]
fn split_keeps_class_ratio_within_one_record() {
    let dataset = sample_dataset().unwrap();
    let (_, y) = dataset.to_arrays().unwrap();
    let split = stratified_split(&y, 0.2, 42).unwrap();

    assert_eq!(split.train.len() + split.test.len(), y.len());
    let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..y.len()).collect::<Vec<_>>());

    let positives = dataset.positives() as f64;
    let test_pos = split.test.iter().filter(|&&i| y[i] == 1).count() as f64;
    let expected = positives * split.test.len() as f64 / y.len() as f64;
    assert!((test_pos - expected).abs() <= 1.0, "{} vs {}", test_pos, expected);
}

#[test]
fn split_depends_on_seed_only() {
    let (_, y) = sample_dataset().unwrap().to_arrays().unwrap();
    assert_eq!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 42).unwrap());
    assert_ne!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 7).unwrap());
}

/* ------------------------------------------------------------------ */
/* Scaling                                                            */
/* ------------------------------------------------------------------ */

#[test]
fn scaled_training_partition_is_standardized() {
    let dataset = sample_dataset().unwrap();
    let data = prepare_data(&dataset, 0.2, 42, ImputationScope::FullDataset).unwrap();
    assert_eq!(data.x_train.ncols(), N_FEATURES);

    for col in data.x_train.columns() {
        let n = col.len() as f64;
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-9);
    }
}

#[test]
fn scaler_round_trip_recovers_inputs() {
    let (x, _) = sample_dataset().unwrap().to_arrays().unwrap();
    let scaler = fit_scaler(&x).unwrap();
    let back = inverse_transform_all(&transform_all(&x, &scaler).unwrap(), &scaler).unwrap();
    for (a, b) in x.iter().zip(back.iter()) {
        assert!((a - b).abs() < 1e-9 * a.abs().max(1.0));
    }
}
