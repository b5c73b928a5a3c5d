//! Atomic JSON document persistence
//!
//! Settings and the pending-job snapshot are each a single small JSON
//! document. Writes go to a sibling temp file first and are then renamed
//! over the target, so a concurrent reader never observes a partial
//! document. There is no locking against concurrent writers; usage is
//! single-process, single-writer.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::PersistenceError;

/// Load a JSON document, falling back to `default` on any failure.
///
/// Missing file, malformed JSON, and I/O errors are all treated the same
/// way: the default is returned and the cause is only logged at debug
/// level. Callers cannot distinguish "not found" from "corrupt".
pub fn load_or_default<T: DeserializeOwned>(path: &Path, default: T) -> T {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Could not read {}: {} - using default", path.display(), e);
            return default;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not parse {}: {} - using default", path.display(), e);
            default
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// The document is written to `{path}.tmp` and renamed into place. If the
/// process dies between the two steps, the target keeps its previous
/// content and only a stale temp file is left behind.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = temp_path(path);

    fs::write(&tmp, json).map_err(|source| PersistenceError::Io {
        path: tmp.display().to_string(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| PersistenceError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    fn settings() -> Settings {
        Settings {
            ig_business_id: "1784".to_string(),
            access_token: "EAAB-token".to_string(),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        save_atomic(&path, &settings()).unwrap();
        let loaded: Settings = load_or_default(&path, Settings::default());
        assert_eq!(loaded, settings());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let loaded: Settings = load_or_default(&path, settings());
        assert_eq!(loaded, settings());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let loaded: Settings = load_or_default(&path, Settings::default());
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_interrupted_write_leaves_prior_value_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        save_atomic(&path, &settings()).unwrap();

        // Simulate a crash after the temp write but before the rename: a
        // half-written temp file appears next to the target.
        fs::write(temp_path(&path), "{\"ig_business_id\": \"17").unwrap();

        let loaded: Settings = load_or_default(&path, Settings::default());
        assert_eq!(loaded, settings());
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        save_atomic(&path, &settings()).unwrap();

        let replacement = Settings {
            ig_business_id: "9999".to_string(),
            access_token: String::new(),
        };
        save_atomic(&path, &replacement).unwrap();

        let loaded: Settings = load_or_default(&path, Settings::default());
        assert_eq!(loaded, replacement);
        assert!(!temp_path(&path).exists());
    }
}
