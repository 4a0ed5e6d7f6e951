//! Record and dataset types for the clinical measurements.
//!
//! Columns follow the public Pima Indians Diabetes dataset order: pregnancies,
//! glucose, blood pressure, skin thickness, insulin, BMI, pedigree score and age,
//! followed by the 0/1 outcome in labeled data.
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

pub const N_FEATURES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    PedigreeFunction,
    Age,
}

impl Feature {
    pub const ALL: [Feature; N_FEATURES] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
        Feature::PedigreeFunction,
        Feature::Age,
    ];

    /// Column position in the dataset and in feature matrices.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "Blood Pressure",
            Feature::SkinThickness => "Skin Thickness",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::PedigreeFunction => "Pedigree Function",
            Feature::Age => "Age",
        }
    }

    /// A recorded zero is not physiologically valid for these columns and is
    /// treated as a missing value.
    pub fn zero_is_missing(self) -> bool {
        matches!(
            self,
            Feature::Glucose
                | Feature::BloodPressure
                | Feature::SkinThickness
                | Feature::Insulin
                | Feature::Bmi
        )
    }

    /// Documented input range (inclusive) for form-level validation.
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            Feature::Pregnancies => (0.0, 20.0),
            Feature::Glucose => (0.0, 300.0),
            Feature::BloodPressure => (0.0, 200.0),
            Feature::SkinThickness => (0.0, 100.0),
            Feature::Insulin => (0.0, 900.0),
            Feature::Bmi => (0.0, 110.0),
            Feature::PedigreeFunction => (0.0, 3.0),
            Feature::Age => (1.0, 120.0),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One subject's eight clinical measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatientRecord {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub pedigree: f64,
    pub age: f64,
}

impl PatientRecord {
    pub fn from_values(values: [f64; N_FEATURES]) -> Self {
        let [pregnancies, glucose, blood_pressure, skin_thickness, insulin, bmi, pedigree, age] =
            values;
        PatientRecord {
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            pedigree,
            age,
        }
    }

    pub fn values(&self) -> [f64; N_FEATURES] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.pedigree,
            self.age,
        ]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values()[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        let mut values = self.values();
        values[feature.index()] = value;
        *self = PatientRecord::from_values(values);
    }

    /// Features whose value lies outside the documented input range.
    pub fn out_of_range(&self) -> Vec<Feature> {
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| {
                let (lo, hi) = f.valid_range();
                let v = self.get(*f);
                !(lo..=hi).contains(&v)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledRecord {
    pub record: PatientRecord,
    /// 1 for a diabetic outcome, 0 otherwise.
    pub outcome: u8,
}

/// Ordered collection of labeled records.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn new(records: Vec<LabeledRecord>) -> Self {
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.outcome == 1).count()
    }

    /// Feature matrix (one row per record) and label vector.
    pub fn to_arrays(&self) -> Result<(Array2<f64>, Vec<u8>), RiskError> {
        if self.records.is_empty() {
            return Err(RiskError::EmptyDataset);
        }
        let mut data = Vec::with_capacity(self.records.len() * N_FEATURES);
        let mut labels = Vec::with_capacity(self.records.len());
        for r in &self.records {
            data.extend_from_slice(&r.record.values());
            labels.push(r.outcome);
        }
        let x = Array2::from_shape_vec((self.records.len(), N_FEATURES), data).map_err(|_| {
            RiskError::ShapeMismatch {
                expected: N_FEATURES,
                found: 0,
            }
        })?;
        Ok((x, labels))
    }

    pub fn log_input_data_summary(&self) {
        let positives = self.positives();
        log::info!(
            "Dataset: {} records, {} diabetic ({:.2}%), {} feature columns",
            self.len(),
            positives,
            if self.is_empty() {
                0.0
            } else {
                positives as f64 / self.len() as f64 * 100.0
            },
            N_FEATURES
        );
    }
}

impl FromIterator<LabeledRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = LabeledRecord>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}
