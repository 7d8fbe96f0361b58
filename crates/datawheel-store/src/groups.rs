//! JSON file store for group membership.
//!
//! The file holds `{"A": [...], "B": [...], "C": [...]}`. A missing file
//! reads as empty groups. Writes go to a sibling temp file which is then
//! renamed over the target, so readers never see a half-written document.

use datawheel_common::GroupAssignment;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for group store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed group file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("json encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Group membership persisted in a JSON file
#[derive(Clone, Debug)]
pub struct GroupStore {
    path: PathBuf,
}

impl GroupStore {
    /// Open the store at `path`. The file is not touched until the first
    /// load or save.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether groups have been saved at this path
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored groups, or empty groups when nothing is stored yet
    pub fn load(&self) -> StoreResult<GroupAssignment> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no group file, using empty groups");
            return Ok(GroupAssignment::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let groups = serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        Ok(groups)
    }

    /// Replace the stored groups
    pub fn save(&self, groups: &GroupAssignment) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(groups)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), members = groups.len(), "saved groups");
        Ok(())
    }

    /// Remove the stored groups. Removing a missing file is not an error.
    pub fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "cleared groups");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datawheel_common::{GroupLabel, Name, parse_names};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = GroupStore::open(dir.path().join("groups.json"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = GroupStore::open(dir.path().join("nested/dir/groups.json"));

        let groups = GroupAssignment::new()
            .with(GroupLabel::A, parse_names("Hưng, Kiệt"))
            .with(GroupLabel::C, parse_names("Sơn"));
        store.save(&groups).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap(), groups);

        // Non-ASCII names are written verbatim
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("Kiệt"));
        assert!(raw.contains("\"B\": []"));
        assert!(!dir.path().join("nested/dir/groups.json.tmp").exists());
    }

    #[test]
    fn test_save_replaces_previous_groups() {
        let dir = tempdir().unwrap();
        let store = GroupStore::open(dir.path().join("groups.json"));

        store
            .save(&GroupAssignment::new().with(GroupLabel::A, parse_names("X, Y")))
            .unwrap();
        store
            .save(&GroupAssignment::new().with(GroupLabel::B, parse_names("Z")))
            .unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.members(GroupLabel::A).is_empty());
        assert_eq!(loaded.members(GroupLabel::B), [Name::new("Z").unwrap()].as_slice());
    }

    #[test]
    fn test_load_legacy_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, r#"{"B": ["Ruby"]}"#).unwrap();

        let loaded = GroupStore::open(&path).load().unwrap();
        assert_eq!(loaded.label_of(&Name::new("Ruby").unwrap()), Some(GroupLabel::B));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = GroupStore::open(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = GroupStore::open(dir.path().join("groups.json"));
        store.clear().unwrap();

        store.save(&GroupAssignment::new()).unwrap();
        assert!(store.exists());
        store.clear().unwrap();
        assert!(!store.exists());
    }
}
