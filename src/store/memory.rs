use parking_lot::Mutex;
use uuid::Uuid;

use super::{evict_overflow, RecordingStore, StoreError, DEFAULT_CAPACITY};
use crate::session::{Artifact, ArtifactMeta};

/// In-process store; contents are lost on exit
pub struct MemoryStore {
    capacity: usize,
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            artifacts: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RecordingStore for MemoryStore {
    fn save(&self, artifact: &Artifact) -> Result<Vec<ArtifactMeta>, StoreError> {
        let mut artifacts = self.artifacts.lock();
        artifacts.push(artifact.clone());

        Ok(evict_overflow(&mut artifacts, self.capacity)
            .into_iter()
            .map(|evicted| evicted.meta().clone())
            .collect())
    }

    fn list(&self) -> Result<Vec<ArtifactMeta>, StoreError> {
        Ok(self
            .artifacts
            .lock()
            .iter()
            .map(|artifact| artifact.meta().clone())
            .collect())
    }

    fn get(&self, id: Uuid) -> Result<Option<Artifact>, StoreError> {
        Ok(self
            .artifacts
            .lock()
            .iter()
            .find(|artifact| artifact.id() == id)
            .cloned())
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut artifacts = self.artifacts.lock();
        let before = artifacts.len();
        artifacts.retain(|artifact| artifact.id() != id);
        Ok(artifacts.len() != before)
    }
}
