use async_trait::async_trait;
use learn_core::model::LearnerId;
use learn_core::ProgressMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Repository contract for learner progress.
///
/// Progress is stored as a whole map per learner; `save` replaces whatever
/// was stored before for that learner.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load a learner's completion records. Unknown learners have no records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read or decoded.
    async fn load(&self, learner: &LearnerId) -> Result<ProgressMap, StorageError>;

    /// Replace a learner's completion records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be stored.
    async fn save(&self, learner: &LearnerId, records: &ProgressMap) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryProgressRepository {
    learners: Arc<Mutex<HashMap<LearnerId, ProgressMap>>>,
}

impl InMemoryProgressRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn load(&self, learner: &LearnerId) -> Result<ProgressMap, StorageError> {
        let guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(learner).cloned().unwrap_or_default())
    }

    async fn save(&self, learner: &LearnerId, records: &ProgressMap) -> Result<(), StorageError> {
        let mut guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(learner.clone(), records.clone());
        Ok(())
    }
}

/// Holds the progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryProgressRepository::new());
        Self { progress }
    }
}
