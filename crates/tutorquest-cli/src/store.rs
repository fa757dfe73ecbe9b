//! File-backed learner state: one JSON blob per learner under a directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;
use tutorquest_core::{StateStore, StoreError};

/// Stores `<dir>/<learner>.json`, replacing it atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, learner: &str) -> Result<PathBuf, StoreError> {
        validate_learner(learner)?;
        Ok(self.dir.join(format!("{learner}.json")))
    }
}

/// Learner ids become file names: ASCII letters, digits, `-` and `_` only.
pub fn validate_learner(learner: &str) -> Result<(), StoreError> {
    let ok = !learner.is_empty()
        && learner.len() <= 64
        && learner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidLearner(learner.to_string()))
    }
}

impl StateStore for FileStore {
    fn load(&self, learner: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(learner)?;
        match std::fs::read_to_string(&path) {
            Ok(blob) => {
                debug!(path = %path.display(), bytes = blob.len(), "state loaded");
                Ok(Some(blob))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed(format!("{}: {e}", path.display()))),
        }
    }

    fn save(&mut self, learner: &str, blob: &str) -> Result<(), StoreError> {
        let path = self.path_for(learner)?;
        let tmp = self.dir.join(format!("{learner}.json.tmp"));
        let write_err = |e: std::io::Error| StoreError::WriteFailed(format!("{}: {e}", path.display()));

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        std::fs::write(&tmp, blob).map_err(write_err)?;
        std::fs::rename(&tmp, &path).map_err(write_err)?;
        debug!(path = %path.display(), bytes = blob.len(), "state saved");
        Ok(())
    }

    fn delete(&mut self, learner: &str) -> Result<bool, StoreError> {
        let path = self.path_for(learner)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::WriteFailed(format!("{}: {e}", path.display()))),
        }
    }
}
