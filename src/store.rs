// Snapshot store: the durable hand-off between a hunt and the deal renderer.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::DealSet;

const INDENT: &[u8] = b"    ";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No snapshot at {0}")]
    NotFound(PathBuf),

    #[error("Snapshot at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub trait SnapshotStore: Send + Sync {
    // Replaces whatever was stored before
    fn save(&self, deals: &DealSet) -> Result<(), StoreError>;

    fn load(&self) -> Result<DealSet, StoreError>;
}

/// Snapshot kept as an indented JSON array in a single file.
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so readers see either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_temp(&self, temp: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(temp)?;
        file.write_all(bytes)?;
        file.write_all(b"\n")?;
        file.sync_all()
    }
}

pub fn to_indented_json(deals: &DealSet) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    deals.serialize(&mut serializer)?;
    Ok(buf)
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, deals: &DealSet) -> Result<(), StoreError> {
        let bytes = to_indented_json(deals)?;
        let temp = self.temp_path();

        if let Err(e) = self.write_temp(&temp, &bytes) {
            fs::remove_file(&temp).ok();
            return Err(self.io_error(e));
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            fs::remove_file(&temp).ok();
            return Err(self.io_error(e));
        }

        info!(path = %self.path.display(), deals = deals.len(), "Snapshot saved");
        Ok(())
    }

    fn load(&self) -> Result<DealSet, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let deals: DealSet = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), deals = deals.len(), "Snapshot loaded");
        Ok(deals)
    }
}


#[cfg(test)]
mod tests {
    use super::test_dir::ScratchDir;
    use super::*;
    use crate::model::fixtures::offer;
    use tokio_test::{assert_err, assert_ok};

    fn deals(amounts: &[&str]) -> DealSet {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| offer(&format!("off_{}", i), a, "LIS", "LHR"))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_load_before_save_is_not_found() {
        let dir = ScratchDir::new("empty");
        let store = JsonFileStore::new(dir.path().join("latest_deals.json"));

        let err = store.load().unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {:?}", err);
    }

    #[test]
    fn test_save_then_load() {
        let dir = ScratchDir::new("roundtrip");
        let store = JsonFileStore::new(dir.path().join("latest_deals.json"));
        let saved = deals(&["220.00", "310.00"]);

        assert_ok!(store.save(&saved));
        assert_eq!(store.load().unwrap(), saved);
    }

    #[test]
    fn test_written_record_is_indented_array() {
        let dir = ScratchDir::new("format");
        let store = JsonFileStore::new(dir.path().join("latest_deals.json"));
        store.save(&deals(&["99.00"])).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"id\": \"off_0\""));
        assert!(!dir.path().join("latest_deals.json.tmp").exists());
    }

    #[test]
    fn test_saving_twice_replaces() {
        let dir = ScratchDir::new("replace");
        let store = JsonFileStore::new(dir.path().join("latest_deals.json"));
        let snapshot = deals(&["50.00", "60.00"]);

        store.save(&snapshot).unwrap();
        let once = std::fs::read_to_string(store.path()).unwrap();
        store.save(&snapshot).unwrap();
        let twice = std::fs::read_to_string(store.path()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(store.load().unwrap().len(), 2);

        store.save(&deals(&["70.00"])).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_parse_error() {
        let dir = ScratchDir::new("corrupt");
        let path = dir.path().join("latest_deals.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = ScratchDir::new("failure");
        let store = JsonFileStore::new(dir.path().join("latest_deals.json"));
        let previous = deals(&["120.00"]);
        store.save(&previous).unwrap();

        // A directory where the temp file should go makes the write fail
        std::fs::create_dir(dir.path().join("latest_deals.json.tmp")).unwrap();
        let result = store.save(&deals(&["1.00", "2.00"]));
        assert!(matches!(assert_err!(result), StoreError::Io { .. }));

        assert_eq!(store.load().unwrap(), previous);
    }

    #[test]
    fn test_failed_first_save_leaves_nothing() {
        let dir = ScratchDir::new("missing_parent");
        let store = JsonFileStore::new(dir.path().join("no_such_dir").join("latest_deals.json"));

        assert!(store.save(&deals(&["10.00"])).is_err());
        assert!(store.load().unwrap_err().is_not_found());
    }
}
