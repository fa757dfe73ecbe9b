use std::collections::HashMap;

/// Errors from state store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("state read failed: {0}")]
    ReadFailed(String),
    #[error("state write failed: {0}")]
    WriteFailed(String),
    #[error("invalid learner id: {0}")]
    InvalidLearner(String),
}

/// Key-value store holding one opaque state blob per learner.
///
/// Writes replace the whole blob; last writer wins.
pub trait StateStore {
    fn load(&self, learner: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, learner: &str, blob: &str) -> Result<(), StoreError>;
    fn delete(&mut self, learner: &str) -> Result<bool, StoreError>;
}

/// In-memory implementation for testing and lightweight usage.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blobs: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, learner: impl Into<String>, blob: impl Into<String>) -> Self {
        self.blobs.insert(learner.into(), blob.into());
        self
    }

    /// Make every `save` fail, simulating an unavailable backend.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for InMemoryStore {
    fn load(&self, learner: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(learner).cloned())
    }

    fn save(&mut self, learner: &str, blob: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed("store is read-only".to_string()));
        }
        self.blobs.insert(learner.to_string(), blob.to_string());
        self.writes += 1;
        Ok(())
    }

    fn delete(&mut self, learner: &str) -> Result<bool, StoreError> {
        Ok(self.blobs.remove(learner).is_some())
    }
}
