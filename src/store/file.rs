//! JSON document store on the local file system.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{DocumentConnection, PositionStore, StagedWrite, StoreConnection, StoreDocument};
use crate::error::StoreError;

/// Persists every schema's pages and positions in one JSON file.
///
/// A commit re-reads the file, applies its staged writes and replaces the
/// file through a rename, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document; a missing file reads as empty.
    pub fn load(&self) -> Result<StoreDocument, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, writes: Vec<StagedWrite>) -> Result<(), StoreError> {
        let mut doc = self.load()?;
        doc.apply(&writes);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path:? = self.path, writes = writes.len(); "Committed store document");
        Ok(())
    }
}

impl PositionStore for FileStore {
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StoreError> {
        let snapshot = self.load()?;
        Ok(Box::new(DocumentConnection::new(snapshot, move |writes| {
            self.write_atomic(writes)
        })))
    }
}
