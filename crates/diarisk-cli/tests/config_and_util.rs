use std::fs;

use diarisk_classifiers::config::{load_training_config, ImputationScope, ModelType, TrainingConfig};
use diarisk_cli::train::run_train;

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.json");
    fs::write(
        &path,
        r#"{ "test_fraction": 0.25, "imputation": "training_partition", "cv_folds": 4 }"#,
    )
    .unwrap();

    let config = load_training_config(&path).unwrap();
    assert_eq!(config.test_fraction, 0.25);
    assert_eq!(config.imputation, ImputationScope::TrainingPartition);
    assert_eq!(config.resolve_cv_folds(10), 4);
    assert_eq!(config.candidates.len(), 5);
    assert_eq!(config.seed, 42);
}

#[test]
fn config_round_trips_through_json() {
    let config = TrainingConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let back: TrainingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn model_type_names_parse() {
    for name in ["lr", "decision-tree", "forest", "GBDT", "svm"] {
        assert!(name.parse::<ModelType>().is_ok(), "{}", name);
    }
    assert!("xgboost".parse::<ModelType>().is_err());
}

#[test]
fn missing_config_file_is_an_error() {
    let err = load_training_config("/nonexistent/diarisk.json").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config"));
}

#[test]
fn run_train_rejects_non_csv_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    fs::write(&data, "1,2,3").unwrap();
    let config = TrainingConfig {
        data: Some(data),
        output_dir: dir.path().join("model"),
        ..TrainingConfig::default()
    };
    let err = run_train(&config).unwrap_err();
    assert!(err.to_string().contains(".csv"));
}
