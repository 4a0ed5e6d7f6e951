//! `diarisk history`: show, export or clear a subject's assessments.
use std::path::Path;

use anyhow::Result;

use diarisk_classifiers::history::{HistoryEntry, HistoryStore};
use diarisk_classifiers::io::write_assessments_csv_file;
use diarisk_classifiers::report::history_report;

pub fn format_history(subject: &str, entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("No assessments recorded for '{}'\n", subject);
    }
    let mut out = format!("{} assessment(s) for '{}'\n", entries.len(), subject);
    out.push_str(&format!(
        "{:<20}{:<13}{:>8}{:>9}{:>7}\n",
        "Date", "Risk", "Prob %", "Glucose", "BMI"
    ));
    for e in entries {
        out.push_str(&format!(
            "{:<20}{:<13}{:>8.1}{:>9}{:>7}\n",
            e.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            e.tier.label(),
            e.probability * 100.0,
            e.record.glucose,
            e.record.bmi
        ));
    }
    out
}

/// Load a subject's history and write the requested exports.
pub fn run_history(
    history_path: &Path,
    subject: &str,
    csv: Option<&Path>,
    html: Option<&Path>,
) -> Result<Vec<HistoryEntry>> {
    let store = HistoryStore::new(history_path);
    let entries = store.entries(subject)?;
    log::info!(
        "[diarisk::history] {} assessment(s) for '{}' in {}",
        entries.len(),
        subject,
        history_path.display()
    );
    if let Some(path) = csv {
        write_assessments_csv_file(path, &entries)?;
    }
    if let Some(path) = html {
        history_report(subject, &entries).save_to_file(path)?;
    }
    Ok(entries)
}

pub fn clear_history(history_path: &Path, subject: &str) -> Result<usize> {
    let removed = HistoryStore::new(history_path).clear(subject)?;
    log::info!("[diarisk::history] Removed {} assessment(s) for '{}'", removed, subject);
    Ok(removed)
}
