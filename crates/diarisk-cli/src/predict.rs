//! `diarisk predict`: score one or more records with a trained bundle.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Deserialize;

use diarisk_classifiers::data_handling::N_FEATURES;
use diarisk_classifiers::history::{HistoryEntry, HistoryStore};
use diarisk_classifiers::io::write_assessments_csv_file;
use diarisk_classifiers::{Feature, PatientRecord, RiskAssessment, RiskPredictor};

/// Argument id and long flag for each feature, in dataset order.
pub const FEATURE_ARGS: [(&str, &str, Feature); N_FEATURES] = [
    ("pregnancies", "pregnancies", Feature::Pregnancies),
    ("glucose", "glucose", Feature::Glucose),
    ("blood_pressure", "blood-pressure", Feature::BloodPressure),
    ("skin_thickness", "skin-thickness", Feature::SkinThickness),
    ("insulin", "insulin", Feature::Insulin),
    ("bmi", "bmi", Feature::Bmi),
    ("pedigree", "pedigree", Feature::PedigreeFunction),
    ("age", "age", Feature::Age),
];

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordInput {
    One(PatientRecord),
    Many(Vec<PatientRecord>),
}

/// Read a JSON file holding one record object or an array of them.
pub fn load_records_json<P: AsRef<Path>>(path: P) -> Result<Vec<PatientRecord>> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read input: {}", path.as_ref().display()))?;
    let parsed: RecordInput = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input: {}", path.as_ref().display()))?;
    Ok(match parsed {
        RecordInput::One(r) => vec![r],
        RecordInput::Many(rs) => rs,
    })
}

/// Build a record from the per-feature arguments. Every feature is required.
pub fn record_from_arguments(matches: &ArgMatches) -> Result<PatientRecord> {
    let mut values = [0.0f64; N_FEATURES];
    let mut missing = Vec::new();
    for (id, long, feature) in FEATURE_ARGS {
        match matches.get_one::<f64>(id) {
            Some(v) => values[feature.index()] = *v,
            None => missing.push(format!("--{}", long)),
        }
    }
    if !missing.is_empty() {
        anyhow::bail!(
            "Missing measurements: {} (or pass --input with a JSON record)",
            missing.join(", ")
        );
    }
    Ok(PatientRecord::from_values(values))
}

/// Reject values outside the documented input ranges.
pub fn validate_ranges(record: &PatientRecord) -> Result<()> {
    let bad = record.out_of_range();
    if bad.is_empty() {
        return Ok(());
    }
    let details: Vec<String> = bad
        .iter()
        .map(|f| {
            let (lo, hi) = f.valid_range();
            format!("{} = {} (expected {}-{})", f, record.get(*f), lo, hi)
        })
        .collect();
    anyhow::bail!("Values out of range: {}", details.join("; "))
}

/// Where to record and export assessments.
#[derive(Debug, Clone, Default)]
pub struct PredictOptions {
    pub subject: Option<String>,
    pub history: PathBuf,
    pub report_csv: Option<PathBuf>,
}

pub fn run_predict(
    model_dir: &Path,
    records: &[PatientRecord],
    options: &PredictOptions,
) -> Result<(RiskPredictor, Vec<RiskAssessment>)> {
    for record in records {
        validate_ranges(record)?;
    }
    let predictor = RiskPredictor::from_store(model_dir)
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;
    log::info!(
        "[diarisk::predict] Using {} (bundle {})",
        predictor.model_name(),
        predictor.bundle_id()
    );
    let assessments = predictor.predict_batch(records)?;

    let entries: Vec<HistoryEntry> = records
        .iter()
        .zip(&assessments)
        .map(|(r, a)| HistoryEntry::new(*r, a))
        .collect();

    if let Some(subject) = &options.subject {
        let store = HistoryStore::new(&options.history);
        for entry in &entries {
            store.append(subject, entry.clone())?;
        }
        log::info!(
            "[diarisk::predict] Saved {} assessment(s) for '{}' to {}",
            entries.len(),
            subject,
            options.history.display()
        );
    }
    if let Some(path) = &options.report_csv {
        write_assessments_csv_file(path, &entries)?;
    }
    Ok((predictor, assessments))
}

pub fn format_assessment(record: &PatientRecord, assessment: &RiskAssessment) -> String {
    let mut out = format!(
        "{} ({:.1}%): {}\n",
        assessment.tier,
        assessment.probability * 100.0,
        if assessment.label == 1 {
            "diabetes likely"
        } else {
            "diabetes unlikely"
        }
    );
    out.push_str(&format!(
        "  glucose {} mg/dL, BMI {}, blood pressure {} mm Hg, age {}\n",
        record.glucose, record.bmi, record.blood_pressure, record.age
    ));
    for rec in &assessment.recommendations {
        out.push_str(&format!("  - {}\n", rec.message()));
    }
    out
}
