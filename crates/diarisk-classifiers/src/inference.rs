//! Online risk scoring with a frozen model bundle.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::bundle::{BundleStore, ModelBundle, ModelMetrics};
use crate::data_handling::{PatientRecord, N_FEATURES};
use crate::error::RiskError;
use crate::models::classifier_trait::ClassifierModel;
use crate::preprocessing::{impute_all, transform_all};

/// Upper bounds (exclusive) of the low and medium tiers.
pub const LOW_RISK_BELOW: f64 = 0.3;
pub const MEDIUM_RISK_BELOW: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(p: f64) -> RiskTier {
        if p < LOW_RISK_BELOW {
            RiskTier::Low
        } else if p < MEDIUM_RISK_BELOW {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Follow-up advice derived from the inputs and the predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ConsultProvider,
    HighGlucose,
    BorderlineGlucose,
    Obese,
    Overweight,
    HighBloodPressure,
    Exercise,
    Diet,
    Monitoring,
    Maintain,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Recommendation::ConsultProvider => {
                "Consult a healthcare provider for a comprehensive diabetes evaluation."
            }
            Recommendation::HighGlucose => {
                "Glucose is high (above 140 mg/dL); monitor blood sugar closely."
            }
            Recommendation::BorderlineGlucose => {
                "Glucose is borderline (above 100 mg/dL); consider dietary changes."
            }
            Recommendation::Obese => "BMI is in the obese range; a weight-loss program is advised.",
            Recommendation::Overweight => "BMI is in the overweight range; aim for gradual weight loss.",
            Recommendation::HighBloodPressure => {
                "Diastolic blood pressure is elevated (above 90 mm Hg); monitor regularly."
            }
            Recommendation::Exercise => "Exercise at least 150 minutes per week.",
            Recommendation::Diet => "Follow a balanced diet with limited refined sugar.",
            Recommendation::Monitoring => "Check blood glucose regularly.",
            Recommendation::Maintain => "Keep up the current healthy lifestyle.",
        }
    }

    /// Recommendations for one record, most urgent first.
    pub fn for_record(record: &PatientRecord, label: u8) -> Vec<Recommendation> {
        let positive = label == 1;
        let mut out = Vec::new();
        if positive {
            out.push(Recommendation::ConsultProvider);
        }
        if record.glucose > 140.0 {
            out.push(Recommendation::HighGlucose);
        } else if record.glucose > 100.0 {
            out.push(Recommendation::BorderlineGlucose);
        }
        if record.bmi > 30.0 {
            out.push(Recommendation::Obese);
        } else if record.bmi > 25.0 {
            out.push(Recommendation::Overweight);
        }
        if record.blood_pressure > 90.0 {
            out.push(Recommendation::HighBloodPressure);
        }
        if positive || record.glucose > 100.0 || record.bmi > 25.0 {
            out.extend([
                Recommendation::Exercise,
                Recommendation::Diet,
                Recommendation::Monitoring,
            ]);
        } else {
            out.push(Recommendation::Maintain);
        }
        out
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 1 when the classifier's decision rule says diabetic.
    pub label: u8,
    /// Positive-class probability in [0, 1].
    pub probability: f64,
    pub tier: RiskTier,
    pub recommendations: Vec<Recommendation>,
}

/// Cheap-to-clone handle on a loaded bundle, safe to share across threads.
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    bundle: Arc<ModelBundle>,
}

impl RiskPredictor {
    /// Wrap a bundle, rejecting classifiers that cannot produce probabilities.
    pub fn new(bundle: ModelBundle) -> Result<Self, RiskError> {
        if !bundle.classifier.supports_proba() {
            return Err(RiskError::ProbabilityUnsupported(bundle.classifier.family()));
        }
        Ok(RiskPredictor {
            bundle: Arc::new(bundle),
        })
    }

    pub fn from_store<P: AsRef<Path>>(dir: P) -> Result<Self, RiskError> {
        RiskPredictor::new(BundleStore::new(dir).load()?)
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle.bundle_id
    }

    pub fn metrics(&self) -> &ModelMetrics {
        &self.bundle.metrics
    }

    pub fn model_name(&self) -> &str {
        self.bundle.classifier.name()
    }

    /// Impute and scale with the frozen parameters.
    fn prepare(&self, x: &Array2<f64>) -> Result<Array2<f64>, RiskError> {
        let pre = &self.bundle.preprocessor;
        let imputed = impute_all(x, &pre.imputer)?;
        transform_all(&imputed, &pre.scaler)
    }

    pub fn predict(&self, record: &PatientRecord) -> Result<RiskAssessment, RiskError> {
        let mut assessments = self.predict_batch(std::slice::from_ref(record))?;
        assessments.pop().ok_or(RiskError::EmptyDataset)
    }

    pub fn predict_batch(&self, records: &[PatientRecord]) -> Result<Vec<RiskAssessment>, RiskError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let x = Array2::from_shape_fn((records.len(), N_FEATURES), |(i, j)| {
            records[i].values()[j]
        });
        let scaled = self.prepare(&x)?;

        let classifier = &self.bundle.classifier;
        let labels = classifier.predict(&scaled)?;
        let probabilities = classifier.predict_proba(&scaled)?;

        records
            .iter()
            .zip(labels.into_iter().zip(probabilities))
            .map(|(record, (label, probability))| {
                if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                    return Err(RiskError::InvalidProbability(probability));
                }
                let tier = RiskTier::from_probability(probability);
                log::trace!("label {} probability {:.4} -> {}", label, probability, tier);
                Ok(RiskAssessment {
                    label,
                    probability,
                    tier,
                    recommendations: Recommendation::for_record(record, label),
                })
            })
            .collect()
    }
}
