use diarisk_classifiers::config::{default_candidates, ModelConfig, ModelType};
use diarisk_classifiers::models::classifier_trait::ClassifierModel;
use diarisk_classifiers::models::factory;
use diarisk_classifiers::RiskError;
use ndarray::Array2;

fn tiny_dataset() -> (Array2<f64>, Vec<u8>) {
    let x = Array2::from_shape_vec(
        (12, 2),
        vec![
            1.0, 0.0, // class 1
            0.0, 1.0, // class 0
            1.0, 0.1, // class 1
            0.0, 0.9, // class 0
            1.1, 0.0, // class 1
            0.0, 1.2, // class 0
            0.9, 0.2, // class 1
            0.1, 1.1, // class 0
            1.2, 0.1, // class 1
            0.2, 1.0, // class 0
            1.0, 0.3, // class 1
            0.1, 0.8, // class 0
        ],
    )
    .expect("failed to create feature matrix");
    let y = (0..12).map(|i| (i % 2 == 0) as u8).collect();
    (x, y)
}

#[test]
fn test_factory_builds_and_predicts() {
    let (x, y) = tiny_dataset();
    for params in default_candidates() {
        let family = params.family();
        let mut model = factory::build_model(params);
        model.fit(&x, &y).unwrap_or_else(|e| panic!("{} failed to fit: {}", family, e));

        let labels = model.predict(&x).unwrap();
        assert_eq!(labels.len(), x.nrows(), "{}", family);
        assert!(labels.iter().all(|&l| l <= 1));

        let probs = model.predict_proba(&x).unwrap();
        assert_eq!(probs.len(), x.nrows(), "{}", family);
        assert!(
            probs.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)),
            "{} produced {:?}",
            family,
            probs
        );
    }
}

#[test]
fn unfitted_models_refuse_to_predict() {
    let (x, _) = tiny_dataset();
    for params in default_candidates() {
        let model = factory::build_model(params);
        assert!(matches!(model.predict(&x), Err(RiskError::NotFitted(_))));
    }
}

#[test]
fn label_count_mismatch_is_rejected() {
    let (x, y) = tiny_dataset();
    let mut model = factory::build_model(ModelConfig::new(42, ModelType::default()));
    assert!(model.fit(&x, &y[..5]).is_err());
}

#[test]
fn fitted_model_survives_json_round_trip() {
    let (x, y) = tiny_dataset();
    let model_type: ModelType = "random_forest".parse().unwrap();
    let mut model = factory::build_model(ModelConfig::new(7, model_type));
    model.fit(&x, &y).unwrap();

    let json = serde_json::to_string(&model).unwrap();
    let restored: diarisk_classifiers::models::Classifier = serde_json::from_str(&json).unwrap();
    assert_eq!(
        restored.predict_proba(&x).unwrap(),
        model.predict_proba(&x).unwrap()
    );
}
