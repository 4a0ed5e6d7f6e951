//! The persisted model bundle: selected classifier, fitted preprocessing and
//! metrics, stored as three JSON artifacts that share one bundle id.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::ModelFamily;
use crate::data_handling::{Feature, N_FEATURES};
use crate::error::RiskError;
use crate::metrics::EvaluationResult;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::Classifier;
use crate::preprocessing::{Imputer, Scaler};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METRICS_FILE: &str = "metrics.json";

/// Held-out metrics of the selected model, as stored next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub model_name: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub cv_score: f64,
}

impl ModelMetrics {
    pub fn new(model_name: &str, eval: &EvaluationResult) -> Self {
        ModelMetrics {
            model_name: model_name.to_string(),
            accuracy: eval.accuracy,
            precision: eval.precision,
            recall: eval.recall,
            f1_score: eval.f1_score,
            cv_score: eval.cv_score,
        }
    }
}

/// Frozen imputation medians and scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub imputer: Imputer,
    pub scaler: Scaler,
}

/// Everything inference needs. Never modified after training.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub bundle_id: String,
    pub classifier: Classifier,
    pub preprocessor: Preprocessor,
    pub metrics: ModelMetrics,
}

impl ModelBundle {
    pub fn classifier_family(&self) -> ModelFamily {
        self.classifier.family()
    }
}

#[derive(Serialize, Deserialize)]
struct Artifact<T> {
    bundle_id: String,
    content: T,
}

/// Directory holding one model bundle.
#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
}

impl BundleStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        BundleStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_paths(&self) -> [(&'static str, PathBuf); 3] {
        [
            (CLASSIFIER_FILE, self.dir.join(CLASSIFIER_FILE)),
            (SCALER_FILE, self.dir.join(SCALER_FILE)),
            (METRICS_FILE, self.dir.join(METRICS_FILE)),
        ]
    }

    /// True when at least one artifact is present.
    pub fn exists(&self) -> bool {
        self.artifact_paths().iter().any(|(_, p)| p.is_file())
    }

    /// Write all three artifacts.
    ///
    /// Every artifact is serialized before anything touches the disk, and each
    /// file is replaced through a temp file and rename, so readers never see a
    /// partially written artifact.
    pub fn save(&self, bundle: &ModelBundle) -> Result<(), RiskError> {
        fs::create_dir_all(&self.dir).map_err(|source| RiskError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let [(_, classifier_path), (_, scaler_path), (_, metrics_path)] = self.artifact_paths();
        let payloads = [
            (
                to_json(
                    &classifier_path,
                    &Artifact {
                        bundle_id: bundle.bundle_id.clone(),
                        content: &bundle.classifier,
                    },
                )?,
                classifier_path,
            ),
            (
                to_json(
                    &scaler_path,
                    &Artifact {
                        bundle_id: bundle.bundle_id.clone(),
                        content: &bundle.preprocessor,
                    },
                )?,
                scaler_path,
            ),
            (
                to_json(
                    &metrics_path,
                    &Artifact {
                        bundle_id: bundle.bundle_id.clone(),
                        content: &bundle.metrics,
                    },
                )?,
                metrics_path,
            ),
        ];

        for (json, path) in payloads {
            self.write_atomic(&path, json.as_bytes())?;
        }
        log::info!(
            "Saved model bundle {} ({}) to {}",
            bundle.bundle_id,
            bundle.metrics.model_name,
            self.dir.display()
        );
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), RiskError> {
        let io_err = |source| RiskError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Load and cross-check the three artifacts.
    pub fn load(&self) -> Result<ModelBundle, RiskError> {
        let paths = self.artifact_paths();
        let missing: Vec<&'static str> = paths
            .iter()
            .filter(|(_, p)| !p.is_file())
            .map(|(name, _)| *name)
            .collect();
        if missing.len() == paths.len() {
            return Err(RiskError::NotTrained(self.dir.clone()));
        }
        if !missing.is_empty() {
            return Err(RiskError::IncompleteBundle {
                dir: self.dir.clone(),
                missing,
            });
        }

        let [(_, classifier_path), (_, scaler_path), (_, metrics_path)] = paths;
        let classifier: Artifact<Classifier> = read_artifact(&classifier_path)?;
        let preprocessor: Artifact<Preprocessor> = read_artifact(&scaler_path)?;
        let metrics: Artifact<ModelMetrics> = read_artifact(&metrics_path)?;

        if classifier.bundle_id != preprocessor.bundle_id
            || classifier.bundle_id != metrics.bundle_id
        {
            return Err(RiskError::InvalidBundle(format!(
                "artifacts come from different training runs ({}, {}, {})",
                classifier.bundle_id, preprocessor.bundle_id, metrics.bundle_id
            )));
        }

        let bundle = ModelBundle {
            bundle_id: classifier.bundle_id,
            classifier: classifier.content,
            preprocessor: preprocessor.content,
            metrics: metrics.content,
        };
        validate(&bundle)?;
        log::debug!(
            "Loaded model bundle {} from {}",
            bundle.bundle_id,
            self.dir.display()
        );
        Ok(bundle)
    }
}

fn validate(bundle: &ModelBundle) -> Result<(), RiskError> {
    let pre = &bundle.preprocessor;
    if pre.scaler.mean.len() != N_FEATURES
        || pre.scaler.std.len() != N_FEATURES
        || pre.imputer.medians.len() != N_FEATURES
    {
        return Err(RiskError::InvalidBundle(format!(
            "preprocessing parameters do not cover {} features",
            N_FEATURES
        )));
    }
    if pre.scaler.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(RiskError::InvalidBundle(
            "scaler has a non-positive standard deviation".to_string(),
        ));
    }
    if let Some(feature) = Feature::ALL
        .iter()
        .find(|f| f.zero_is_missing() && pre.imputer.median(**f).is_none())
    {
        return Err(RiskError::InvalidBundle(format!(
            "imputer has no median for {}",
            feature.name()
        )));
    }
    if bundle.metrics.model_name != bundle.classifier.name() {
        return Err(RiskError::InvalidBundle(format!(
            "metrics describe '{}' but the classifier is '{}'",
            bundle.metrics.model_name,
            bundle.classifier.name()
        )));
    }
    Ok(())
}

fn to_json<T: Serialize>(path: &Path, value: &T) -> Result<String, RiskError> {
    serde_json::to_string_pretty(value).map_err(|source| RiskError::Serde {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one artifact. Unparseable content is an invalid bundle, not an I/O
/// failure, so the message carries the offending path.
fn read_artifact<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, RiskError> {
    let content = fs::read_to_string(path).map_err(|source| RiskError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content)
        .map_err(|e| RiskError::InvalidBundle(format!("{}: {}", path.display(), e)))
}
