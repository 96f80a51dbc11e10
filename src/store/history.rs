//! History store implementations.
//!
//! `JsonHistoryStore` keeps every report in one JSON array on disk.
//! `MemoryHistoryStore` is the in-process equivalent.

use crate::analysis::HistoryStore;
use crate::models::AnalysisReport;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// File-backed history: a JSON array of reports.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn list_all(&self) -> Result<Vec<AnalysisReport>> {
        if !self.path.exists() {
            debug!("No history file at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file: {}", self.path.display()))
    }

    fn append(&self, report: &AnalysisReport) -> Result<()> {
        let mut reports = self.list_all()?;
        reports.push(report.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&reports)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;

        debug!(
            "History at {} now holds {} report(s)",
            self.path.display(),
            reports.len()
        );
        Ok(())
    }
}

/// In-memory history.
#[allow(dead_code)] // In-process store, exercised by the engine tests
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    reports: Mutex<Vec<AnalysisReport>>,
}

impl MemoryHistoryStore {
    #[allow(dead_code)]
    pub fn with_reports(reports: Vec<AnalysisReport>) -> Self {
        Self {
            reports: Mutex::new(reports),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn list_all(&self) -> Result<Vec<AnalysisReport>> {
        let reports = self
            .reports
            .lock()
            .map_err(|_| anyhow!("history lock poisoned"))?;
        Ok(reports.clone())
    }

    fn append(&self, report: &AnalysisReport) -> Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow!("history lock poisoned"))?
            .push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use tempfile::TempDir;

    fn report(id: &str) -> AnalysisReport {
        AnalysisReport {
            id: id.to_string(),
            timestamp: 1_700_000_000_000,
            risk_level: RiskLevel::Moderate,
            summary: "Metabolic Irregularities Detected".to_string(),
            diseases: Vec::new(),
            explanation: String::new(),
            recommendation: String::new(),
            biomarker_insights: Vec::new(),
        }
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_list() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nested").join("history.json"));

        store.append(&report("rpt-1")).unwrap();
        store.append(&report("rpt-2")).unwrap();

        let reports = store.list_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, "rpt-1");
        assert_eq!(reports[1].risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonHistoryStore::new(path);
        let err = store.list_all().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse history file"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryHistoryStore::with_reports(vec![report("rpt-1")]);
        store.append(&report("rpt-2")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 2);
    }
}
