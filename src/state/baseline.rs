use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::data::gamma_api::de_lenient_f64;
use crate::data::types::MarketSnapshot;

/// Last-observed state of one market, as of the end of the previous scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub delta: f64,
    /// Older files carry the raw upstream volume, often as a string.
    #[serde(
        default,
        deserialize_with = "de_lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "lastUpdated", alias = "last_updated")]
    pub last_updated: String,
}

impl BaselineRecord {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            delta: snapshot.delta(),
            volume: Some(snapshot.volume),
            title: Some(snapshot.title.clone()),
            last_updated: Utc::now().to_rfc3339(),
        }
    }
}

/// Market slug -> last-observed record.
pub type Baseline = BTreeMap<String, BaselineRecord>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to prepare baseline directory {}: {1}", .0.display())]
    Directory(PathBuf, #[source] io::Error),

    #[error("Failed to write baseline: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize baseline: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace baseline file: {0}")]
    Persist(#[source] io::Error),
}

/// JSON file holding the baseline, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn ensure_dir(&self) -> Result<PathBuf, StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::Directory(dir.clone(), e))?;
        Ok(dir)
    }

    /// Read the baseline. Absent, empty or unparseable files all read as empty.
    pub fn load(&self) -> Baseline {
        if let Err(e) = self.ensure_dir() {
            warn!("{}", e);
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No baseline at {}", self.path.display());
                return Baseline::new();
            }
            Err(e) => {
                warn!("Failed to read baseline {}: {}", self.path.display(), e);
                return Baseline::new();
            }
        };

        if contents.trim().is_empty() {
            return Baseline::new();
        }

        match serde_json::from_str(&contents) {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!("Ignoring unreadable baseline {}: {}", self.path.display(), e);
                Baseline::new()
            }
        }
    }

    /// Write the baseline via a temp file in the same directory, fsync, then rename.
    ///
    /// On any failure the temp file is removed and the previous file is left as it was.
    pub fn save(&self, baseline: &Baseline) -> Result<(), StoreError> {
        let dir = self.ensure_dir()?;

        // The temp file deletes itself when dropped on an error path.
        let mut tmp = tempfile::Builder::new()
            .prefix(".baseline-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;

        serde_json::to_writer_pretty(&mut tmp, baseline)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| StoreError::Persist(e.error))?;
        debug!("Saved {} baseline records to {}", baseline.len(), self.path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(delta: f64) -> BaselineRecord {
        BaselineRecord {
            delta,
            volume: Some(1200.0),
            title: Some("Will it snow in London?".to_string()),
            last_updated: "2026-01-05T10:00:00+00:00".to_string(),
        }
    }

    fn sample_baseline() -> Baseline {
        let mut baseline = Baseline::new();
        baseline.insert("snow-london".to_string(), record(3.25));
        baseline.insert("rate-cut".to_string(), record(-0.1));
        baseline.insert(
            "bare".to_string(),
            BaselineRecord {
                delta: 0.30000000000000004,
                volume: None,
                title: None,
                last_updated: "2026-01-05T10:00:00".to_string(),
            },
        );
        baseline
    }

    fn tmp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().map(|e| e == "tmp").unwrap_or(false))
            .collect()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("history.json"));

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("state").join("radar");
        let store = BaselineStore::new(nested.join("history.json"));

        assert!(store.load().is_empty());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_load_empty_or_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = BaselineStore::new(&path);

        fs::write(&path, "").unwrap();
        assert!(store.load().is_empty());

        fs::write(&path, "{\"truncated\": {\"delta\": 1.0,").unwrap();
        assert!(store.load().is_empty());

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("history.json"));
        let baseline = sample_baseline();

        store.save(&baseline).unwrap();

        assert_eq!(store.load(), baseline);
        assert!(tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_save_writes_camel_case_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = BaselineStore::new(&path);

        store.save(&sample_baseline()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"lastUpdated\""));
        assert!(!raw.contains("\"last_updated\""));
    }

    #[test]
    fn test_load_accepts_snake_case_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"{"old-market": {"delta": 2.5, "volume": 10, "title": "Old", "last_updated": "2025-12-01T08:00:00"}}"#,
        )
        .unwrap();

        let baseline = BaselineStore::new(&path).load();
        assert_eq!(baseline["old-market"].delta, 2.5);
        assert_eq!(baseline["old-market"].last_updated, "2025-12-01T08:00:00");
    }

    #[test]
    fn test_load_accepts_string_and_odd_volumes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"{
                "a": {"delta": 1.0, "volume": "250000.5", "title": "A", "last_updated": "2025-12-01T08:00:00"},
                "b": {"delta": -2.0, "volume": 10, "title": "B", "lastUpdated": "2025-12-01T08:00:00"},
                "c": {"delta": 0.5, "volume": "n/a", "lastUpdated": "2025-12-01T08:00:00"},
                "d": {"delta": 0.0, "volume": null, "lastUpdated": "2025-12-01T08:00:00"}
            }"#,
        )
        .unwrap();

        let baseline = BaselineStore::new(&path).load();
        assert_eq!(baseline.len(), 4);
        assert_eq!(baseline["a"].volume, Some(250000.5));
        assert_eq!(baseline["b"].volume, Some(10.0));
        assert_eq!(baseline["c"].volume, None);
        assert_eq!(baseline["d"].volume, None);
    }

    #[test]
    fn test_interrupted_write_leaves_previous_baseline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = BaselineStore::new(&path);
        let baseline = sample_baseline();
        store.save(&baseline).unwrap();

        // A writer killed before the rename leaves only a partial temp file behind.
        let partial = dir.path().join(".baseline-crashed.tmp");
        fs::write(&partial, "{\"snow-london\": {\"delta\": 9").unwrap();

        assert_eq!(store.load(), baseline);
    }

    #[test]
    fn test_failed_save_keeps_previous_file_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("history.json");

        // Renaming a file over a non-empty directory fails.
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let store = BaselineStore::new(&target);
        let result = store.save(&sample_baseline());

        assert!(matches!(result, Err(StoreError::Persist(_))));
        assert!(target.join("keep").exists());
        assert!(tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_record_from_snapshot() {
        let snapshot = MarketSnapshot {
            id: "eth-flip".to_string(),
            title: "ETH flips BTC?".to_string(),
            category: None,
            volume: 5000.0,
            price_change_ratio: 0.07,
            probability: 0.02,
        };

        let record = BaselineRecord::from_snapshot(&snapshot);
        assert!((record.delta - 7.0).abs() < 1e-9);
        assert_eq!(record.volume, Some(5000.0));
        assert_eq!(record.title.as_deref(), Some("ETH flips BTC?"));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.last_updated).is_ok());
    }
}
