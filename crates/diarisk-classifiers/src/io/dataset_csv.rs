//! Headerless nine-column CSV reader for labeled clinical records.
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;

use crate::data_handling::{Dataset, Feature, LabeledRecord, PatientRecord, N_FEATURES};

const SAMPLE_CSV: &str = include_str!("../../data/pima_sample.csv");

/// Read a dataset file: eight feature columns followed by a 0/1 outcome, no header.
pub fn read_dataset_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open dataset: {}", path.as_ref().display()))?;
    read_records(reader)
        .with_context(|| format!("Failed to load dataset: {}", path.as_ref().display()))
}

/// Same as [`read_dataset_csv`] for any reader.
pub fn read_dataset<R: Read>(input: R) -> Result<Dataset> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(input);
    read_records(reader)
}

/// The 99-row sample of the Pima Indians Diabetes dataset bundled with the crate,
/// used for offline training and tests.
pub fn sample_dataset() -> Result<Dataset> {
    read_dataset(SAMPLE_CSV.as_bytes()).context("Embedded sample dataset is malformed")
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(parse_row(&row, row_idx)?);
    }
    if records.is_empty() {
        bail!("Dataset contains no records");
    }
    let dataset = Dataset::new(records);
    log::debug!("Parsed {} dataset rows", dataset.len());
    Ok(dataset)
}

fn parse_row(row: &StringRecord, row_idx: usize) -> Result<LabeledRecord> {
    if row.len() != N_FEATURES + 1 {
        bail!(
            "Expected {} columns at row {}, found {}",
            N_FEATURES + 1,
            row_idx + 1,
            row.len()
        );
    }

    let mut values = [0.0f64; N_FEATURES];
    for (feature, value) in Feature::ALL.iter().zip(values.iter_mut()) {
        let raw = row.get(feature.index()).unwrap_or_default();
        let parsed = raw.parse::<f64>().with_context(|| {
            format!("Invalid {} value '{}' at row {}", feature, raw, row_idx + 1)
        })?;
        if !parsed.is_finite() || parsed < 0.0 {
            bail!(
                "{} must be a non-negative number at row {}, got {}",
                feature,
                row_idx + 1,
                raw
            );
        }
        *value = parsed;
    }

    let raw_label = row.get(N_FEATURES).unwrap_or_default();
    let outcome = match raw_label.parse::<f64>() {
        Ok(v) if v == 0.0 => 0,
        Ok(v) if v == 1.0 => 1,
        _ => {
            return Err(anyhow!(
                "Invalid outcome '{}' at row {}; expected 0 or 1",
                raw_label,
                row_idx + 1
            ))
        }
    };

    Ok(LabeledRecord {
        record: PatientRecord::from_values(values),
        outcome,
    })
}
