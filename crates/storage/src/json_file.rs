use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use learn_core::model::LearnerId;
use learn_core::ProgressMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::repository::{ProgressRepository, Storage, StorageError};

const FORMAT_VERSION: u32 = 1;

/// On-disk layout: one document for every learner.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressDocument {
    version: u32,
    #[serde(default)]
    learners: BTreeMap<LearnerId, ProgressMap>,
}

fn io<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Io(e.to_string())
}

/// Stores progress for all learners in a single JSON file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so readers never see a partially written document.
#[derive(Clone)]
pub struct JsonFileProgressRepository {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileProgressRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<ProgressDocument, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(ProgressDocument {
                    version: FORMAT_VERSION,
                    learners: BTreeMap::new(),
                });
            }
            Err(err) => return Err(io(err)),
        };

        let doc: ProgressDocument = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if doc.version != FORMAT_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported progress file version {} in {}",
                doc.version,
                self.path.display()
            )));
        }
        Ok(doc)
    }

    async fn write_document(&self, doc: &ProgressDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io)?;
            }
        }

        let contents = serde_json::to_string_pretty(doc)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await.map_err(io)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io)?;
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for JsonFileProgressRepository {
    async fn load(&self, learner: &LearnerId) -> Result<ProgressMap, StorageError> {
        let mut doc = self.read_document().await?;
        Ok(doc.learners.remove(learner).unwrap_or_default())
    }

    async fn save(&self, learner: &LearnerId, records: &ProgressMap) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        doc.learners.insert(learner.clone(), records.clone());
        self.write_document(&doc).await?;
        tracing::debug!(
            learner = %learner,
            records = records.len(),
            path = %self.path.display(),
            "saved progress file"
        );
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file at `path`.
    #[must_use]
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(JsonFileProgressRepository::new(path));
        Self { progress }
    }
}
