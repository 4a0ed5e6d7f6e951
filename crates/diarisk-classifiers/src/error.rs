use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::config::ModelFamily;
use crate::data_handling::Feature;

/// Errors raised by the risk-scoring pipeline and the model bundle store.
#[derive(Debug)]
pub enum RiskError {
    /// No model bundle artifact exists in the store directory.
    NotTrained(PathBuf),
    /// Some, but not all, bundle artifacts are present.
    IncompleteBundle { dir: PathBuf, missing: Vec<&'static str> },
    /// Artifacts are present but do not form one consistent bundle.
    InvalidBundle(String),
    /// A class is absent from the dataset or would be absent from a partition.
    DegenerateSplit { label: u8, count: usize },
    EmptyDataset,
    /// Every value of an imputed column is a missing marker.
    NoObservedValues(Feature),
    ShapeMismatch { expected: usize, found: usize },
    NotFitted(ModelFamily),
    ProbabilityUnsupported(ModelFamily),
    NoEligibleCandidate,
    Training { family: ModelFamily, message: String },
    InvalidProbability(f64),
    Io { path: PathBuf, source: std::io::Error },
    Serde { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RiskError::NotTrained(dir) => write!(
                f,
                "No trained model found in {}; run `diarisk train` first",
                dir.display()
            ),
            RiskError::IncompleteBundle { dir, missing } => write!(
                f,
                "Model bundle in {} is incomplete, missing: {}",
                dir.display(),
                missing.join(", ")
            ),
            RiskError::InvalidBundle(msg) => write!(f, "Invalid model bundle: {}", msg),
            RiskError::DegenerateSplit { label, count } => write!(
                f,
                "Cannot stratify: class {} has {} record(s), which leaves a partition without it",
                label, count
            ),
            RiskError::EmptyDataset => write!(f, "Dataset contains no records"),
            RiskError::NoObservedValues(feature) => write!(
                f,
                "Column '{}' has no non-zero values to compute a median from",
                feature.name()
            ),
            RiskError::ShapeMismatch { expected, found } => write!(
                f,
                "Expected {} feature columns, found {}",
                expected, found
            ),
            RiskError::NotFitted(family) => write!(f, "{} model has not been fitted", family),
            RiskError::ProbabilityUnsupported(family) => write!(
                f,
                "{} model was trained without probability estimates",
                family
            ),
            RiskError::NoEligibleCandidate => write!(
                f,
                "No candidate model supports probability estimates"
            ),
            RiskError::Training { family, message } => {
                write!(f, "Failed to train {}: {}", family, message)
            }
            RiskError::InvalidProbability(p) => {
                write!(f, "Classifier produced an invalid probability: {}", p)
            }
            RiskError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            RiskError::Serde { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl Error for RiskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RiskError::Io { source, .. } => Some(source),
            RiskError::Serde { source, .. } => Some(source),
            _ => None,
        }
    }
}
