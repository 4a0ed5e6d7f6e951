//! diarisk-classifiers: diabetes risk scoring from eight clinical measurements.
//!
//! The crate covers the offline pipeline (CSV ingest, median imputation,
//! stratified split, standard scaling, five candidate classifiers, F1-based
//! selection, three-artifact model bundle) and the online side (an immutable
//! [`inference::RiskPredictor`] handle, risk tiers, recommendations, a
//! per-subject history store and HTML/CSV reporting).
pub mod bundle;
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod history;
pub mod inference;
pub mod io;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod split;
pub mod trainer;

pub use bundle::{BundleStore, ModelBundle, ModelMetrics};
pub use config::{ModelConfig, ModelFamily, ModelType, TrainingConfig};
pub use data_handling::{Dataset, Feature, LabeledRecord, PatientRecord};
pub use error::RiskError;
pub use inference::{Recommendation, RiskAssessment, RiskPredictor, RiskTier};
