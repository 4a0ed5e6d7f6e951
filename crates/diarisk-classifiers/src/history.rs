//! Per-subject prediction history in a single JSON file.
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::data_handling::PatientRecord;
use crate::error::RiskError;
use crate::inference::{RiskAssessment, RiskTier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub record: PatientRecord,
    pub label: u8,
    pub probability: f64,
    pub tier: RiskTier,
}

impl HistoryEntry {
    pub fn new(record: PatientRecord, assessment: &RiskAssessment) -> Self {
        HistoryEntry {
            timestamp: Utc::now(),
            record,
            label: assessment.label,
            probability: assessment.probability,
            tier: assessment.tier,
        }
    }
}

type HistoryMap = BTreeMap<String, Vec<HistoryEntry>>;

/// JSON history file guarded by an in-process lock. Writers replace the
/// whole file through a temp file and rename.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        HistoryStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so poisoning is ignored.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_map(&self) -> Result<HistoryMap, RiskError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HistoryMap::new()),
            Err(source) => {
                return Err(RiskError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(HistoryMap::new());
        }
        serde_json::from_str(&content).map_err(|source| RiskError::Serde {
            path: self.path.clone(),
            source,
        })
    }

    fn write_map(&self, map: &HistoryMap) -> Result<(), RiskError> {
        let json = serde_json::to_vec_pretty(map).map_err(|source| RiskError::Serde {
            path: self.path.clone(),
            source,
        })?;
        let io_err = |source| RiskError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Append one entry to a subject's history.
    pub fn append(&self, subject: &str, entry: HistoryEntry) -> Result<(), RiskError> {
        let _guard = self.guard();
        let mut map = self.read_map()?;
        map.entry(subject.to_string()).or_default().push(entry);
        self.write_map(&map)?;
        log::debug!("Recorded assessment for '{}' in {}", subject, self.path.display());
        Ok(())
    }

    /// Entries for one subject, oldest first. Unknown subjects have none.
    pub fn entries(&self, subject: &str) -> Result<Vec<HistoryEntry>, RiskError> {
        let _guard = self.guard();
        let mut entries = self.read_map()?.remove(subject).unwrap_or_default();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    pub fn subjects(&self) -> Result<Vec<String>, RiskError> {
        let _guard = self.guard();
        Ok(self.read_map()?.into_keys().collect())
    }

    /// Remove a subject's history. Returns how many entries were dropped.
    pub fn clear(&self, subject: &str) -> Result<usize, RiskError> {
        let _guard = self.guard();
        let mut map = self.read_map()?;
        let removed = map.remove(subject).map_or(0, |v| v.len());
        if removed > 0 {
            self.write_map(&map)?;
        }
        Ok(removed)
    }
}
