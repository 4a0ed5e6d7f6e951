//! CSV export of risk assessments.
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data_handling::Feature;
use crate::history::HistoryEntry;

fn header() -> Vec<String> {
    let mut columns = vec![
        "Date".to_string(),
        "Risk Level".to_string(),
        "Probability %".to_string(),
    ];
    columns.extend(Feature::ALL.iter().map(|f| f.name().to_string()));
    columns
}

/// Write one row per entry: date, risk level, probability in percent and the
/// eight inputs.
pub fn write_assessments_csv<W: Write>(writer: W, entries: &[HistoryEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header())?;
    for entry in entries {
        let mut row = vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.tier.label().to_string(),
            format!("{:.1}", entry.probability * 100.0),
        ];
        row.extend(entry.record.values().iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_assessments_csv_file<P: AsRef<Path>>(path: P, entries: &[HistoryEntry]) -> Result<()> {
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create report: {}", path.as_ref().display()))?;
    write_assessments_csv(file, entries)
        .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))?;
    log::info!("Wrote {} assessment(s) to {}", entries.len(), path.as_ref().display());
    Ok(())
}
