use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::StoreError;

/// Opaque byte blobs (photos) addressed by generated ids.
pub trait BlobStore {
    fn put(&self, bytes: &[u8]) -> Result<String, StoreError>;
    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Deleting an unknown id is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Stores each blob as `<uuid>.jpg` in a directory.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path for a well-formed id; anything else is treated as unknown.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        Uuid::parse_str(id)
            .ok()
            .map(|uuid| self.dir.join(format!("{}.jpg", uuid)))
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, bytes: &[u8]) -> Result<String, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4().to_string();
        fs::write(self.dir.join(format!("{}.jpg", id)), bytes)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "jpg") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Uuid::parse_str(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
