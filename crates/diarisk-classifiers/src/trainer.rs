//! Offline training pipeline: impute, split, scale, fit every candidate,
//! score it on the held-out partition and keep the best one.
use chrono::Utc;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::bundle::{ModelBundle, ModelMetrics, Preprocessor};
use crate::config::{ImputationScope, ModelConfig, ModelFamily, TrainingConfig};
use crate::cross_validation::cross_val_accuracy;
use crate::data_handling::Dataset;
use crate::error::RiskError;
use crate::metrics::{ConfusionMatrix, EvaluationResult};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::models::Classifier;
use crate::preprocessing::{fit_imputer, fit_transform, impute_all, transform_all, Imputer, Scaler};
use crate::split::{stratified_split, SplitIndices};

/// Imputed and scaled partitions with the parameters that produced them.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub imputer: Imputer,
    pub scaler: Scaler,
    pub split: SplitIndices,
    pub x_train: Array2<f64>,
    pub y_train: Vec<u8>,
    pub x_test: Array2<f64>,
    pub y_test: Vec<u8>,
}

/// How one candidate did in a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub family: ModelFamily,
    pub config: ModelConfig,
    pub evaluation: EvaluationResult,
    pub fold_accuracy: Vec<f64>,
    /// Whether the candidate could be selected for serving.
    pub eligible: bool,
}

impl CandidateReport {
    pub fn name(&self) -> &'static str {
        self.family.display_name()
    }
}

/// Result of [`run_training`]: the bundle to persist plus the full
/// candidate comparison.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    pub candidates: Vec<CandidateReport>,
    pub selected: usize,
    pub n_train: usize,
    pub n_test: usize,
}

/// Impute, split and scale a dataset.
///
/// The split only depends on the labels, so it is computed first; the imputer
/// is then fitted on every row or on the training rows depending on `scope`,
/// and the scaler always on the imputed training rows.
pub fn prepare_data(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
    scope: ImputationScope,
) -> Result<PreparedData, RiskError> {
    let (x, y) = dataset.to_arrays()?;
    let split = stratified_split(&y, test_fraction, seed)?;

    let x_train_raw = x.select(Axis(0), &split.train);
    let x_test_raw = x.select(Axis(0), &split.test);

    let imputer = match scope {
        ImputationScope::FullDataset => fit_imputer(&x)?,
        ImputationScope::TrainingPartition => fit_imputer(&x_train_raw)?,
    };
    let x_train_imputed = impute_all(&x_train_raw, &imputer)?;
    let x_test_imputed = impute_all(&x_test_raw, &imputer)?;

    let (scaler, x_train) = fit_transform(&x_train_imputed)?;
    let x_test = transform_all(&x_test_imputed, &scaler)?;

    let y_train = split.train.iter().map(|&i| y[i]).collect();
    let y_test = split.test.iter().map(|&i| y[i]).collect();

    Ok(PreparedData {
        imputer,
        scaler,
        split,
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

/// Fit one candidate on the training partition and score it.
pub fn evaluate_candidate(
    config: &ModelConfig,
    data: &PreparedData,
    cv_folds: usize,
) -> Result<(Classifier, CandidateReport), RiskError> {
    let mut model = build_model(config.clone());
    model.fit(&data.x_train, &data.y_train)?;
    let y_pred = model.predict(&data.x_test)?;
    let cm = ConfusionMatrix::from_labels(&data.y_test, &y_pred)?;

    let cv = cross_val_accuracy(config, &data.x_train, &data.y_train, cv_folds)?;
    let evaluation = EvaluationResult::new(&cm, cv.mean());

    let report = CandidateReport {
        family: config.family(),
        config: config.clone(),
        evaluation,
        fold_accuracy: cv.fold_accuracy,
        eligible: model.supports_proba(),
    };
    Ok((model, report))
}

/// Index of the eligible candidate with the strictly highest F1; ties keep
/// the earlier candidate.
pub fn select_best(candidates: &[CandidateReport]) -> Result<usize, RiskError> {
    let mut best: Option<usize> = None;
    for (i, c) in candidates.iter().enumerate() {
        if !c.eligible {
            continue;
        }
        match best {
            Some(b) if c.evaluation.f1_score <= candidates[b].evaluation.f1_score => {}
            _ => best = Some(i),
        }
    }
    best.ok_or(RiskError::NoEligibleCandidate)
}

fn new_bundle_id(family: ModelFamily) -> String {
    let slug = format!("{:?}", family).to_lowercase();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"), slug)
}

/// Run the whole training pipeline on `dataset`.
pub fn run_training(
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, RiskError> {
    dataset.log_input_data_summary();
    if config.candidates.is_empty() {
        return Err(RiskError::NoEligibleCandidate);
    }

    let data = prepare_data(dataset, config.test_fraction, config.seed, config.imputation)?;
    let cv_folds = config.resolve_cv_folds(data.y_train.len());
    log::info!(
        "Training on {} records, testing on {} ({}-fold cross-validation)",
        data.y_train.len(),
        data.y_test.len(),
        cv_folds
    );

    let mut models = Vec::with_capacity(config.candidates.len());
    let mut candidates = Vec::with_capacity(config.candidates.len());
    for candidate in &config.candidates {
        log::info!("Training {}...", candidate.family());
        let (model, report) = evaluate_candidate(candidate, &data, cv_folds)?;
        let e = &report.evaluation;
        log::info!(
            "{}: accuracy {:.4}, precision {:.4}, recall {:.4}, F1 {:.4}, CV {:.4}{}",
            report.name(),
            e.accuracy,
            e.precision,
            e.recall,
            e.f1_score,
            e.cv_score,
            if report.eligible {
                ""
            } else {
                " (no probability support, not selectable)"
            }
        );
        models.push(model);
        candidates.push(report);
    }

    let selected = select_best(&candidates)?;
    let winner = &candidates[selected];
    log::info!(
        "Selected {} with F1 {:.4}",
        winner.name(),
        winner.evaluation.f1_score
    );

    let metrics = ModelMetrics::new(winner.name(), &winner.evaluation);
    let bundle_id = new_bundle_id(winner.family);
    let classifier = models.swap_remove(selected);

    Ok(TrainingOutcome {
        bundle: ModelBundle {
            bundle_id,
            classifier,
            preprocessor: Preprocessor {
                imputer: data.imputer,
                scaler: data.scaler,
            },
            metrics,
        },
        candidates,
        selected,
        n_train: data.y_train.len(),
        n_test: data.y_test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;

    fn report(family: ModelFamily, f1: f64, eligible: bool) -> CandidateReport {
        CandidateReport {
            family,
            config: ModelConfig::new(42, ModelType::default()),
            evaluation: EvaluationResult {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1_score: f1,
                cv_score: 0.0,
            },
            fold_accuracy: vec![],
            eligible,
        }
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let c = vec![
            report(ModelFamily::LogisticRegression, 0.7, true),
            report(ModelFamily::DecisionTree, 0.7, true),
            report(ModelFamily::RandomForest, 0.6, true),
        ];
        assert_eq!(select_best(&c).unwrap(), 0);
    }

    #[test]
    fn ineligible_candidates_are_skipped() {
        let c = vec![
            report(ModelFamily::LogisticRegression, 0.5, true),
            report(ModelFamily::Svm, 0.9, false),
        ];
        assert_eq!(select_best(&c).unwrap(), 0);
        assert!(matches!(
            select_best(&c[1..]),
            Err(RiskError::NoEligibleCandidate)
        ));
    }

    #[test]
    fn bundle_id_names_family() {
        assert!(new_bundle_id(ModelFamily::RandomForest).ends_with("-randomforest"));
    }
}
