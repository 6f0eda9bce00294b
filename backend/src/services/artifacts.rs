//! Directory-backed artifact storage
//!
//! Every artifact is one JSON file under a root directory. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! sees a half-written blob.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store, creating its directory if needed
    pub fn create(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Open an existing store without touching the filesystem
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of an artifact that must already exist
    pub fn require(&self, name: &str) -> AppResult<PathBuf> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(AppError::ArtifactMissing { path });
        }
        Ok(path)
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> AppResult<PathBuf> {
        let path = self.path(name);
        let tmp = self.path(&format!(".{}.tmp", name));
        let bytes = serde_json::to_vec(value)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Saved artifact {}", path.display());
        Ok(path)
    }

    /// Write an artifact whose encoder only writes to a path, keeping the
    /// temporary-then-rename guarantee of [`save_json`](Self::save_json)
    pub fn save_with<E>(&self, name: &str, write: impl FnOnce(&Path) -> Result<(), E>) -> AppResult<PathBuf>
    where
        E: Into<AppError>,
    {
        let path = self.path(name);
        let tmp = self.path(&format!(".{}.tmp", name));
        write(&tmp).map_err(Into::into)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Saved artifact {}", path.display());
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        let path = self.require(name)?;
        let bytes = fs::read(&path)?;
        serde_json::from_slice(&bytes).map_err(|e| AppError::ArtifactCorrupt {
            path,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("nested")).unwrap();
        store.save_json("numbers.json", &vec![1u8, 2, 3]).unwrap();
        let back: Vec<u8> = store.load_json("numbers.json").unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        assert!(!store.path(".numbers.json.tmp").exists());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path());
        let err = store.load_json::<Vec<u8>>("absent.json").unwrap_err();
        assert!(matches!(err, AppError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path());
        fs::write(store.path("bad.json"), b"{not json").unwrap();
        let err = store.load_json::<Vec<u8>>("bad.json").unwrap_err();
        assert!(matches!(err, AppError::ArtifactCorrupt { .. }));
    }
}
