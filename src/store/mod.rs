//! Persistence for finished recordings
//!
//! Stores keep at most `capacity` artifacts and evict the oldest first.
//! `list` returns metadata with the most recent recording last.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::session::{Artifact, ArtifactMeta};

/// Number of recordings kept by default
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Recording {0} is missing its data")]
    MissingData(Uuid),
}

pub trait RecordingStore: Send + Sync {
    /// Persist an artifact; returns whatever was evicted to make room
    fn save(&self, artifact: &Artifact) -> Result<Vec<ArtifactMeta>, StoreError>;

    /// Metadata for every stored artifact, oldest first
    fn list(&self) -> Result<Vec<ArtifactMeta>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Artifact>, StoreError>;

    /// Returns whether something was deleted
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory for the file-backed store
    pub path: PathBuf,
    /// Maximum number of retained recordings
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("recordings"),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Split off the entries over `capacity`, oldest first
fn evict_overflow<T>(entries: &mut Vec<T>, capacity: usize) -> Vec<T> {
    let overflow = entries.len().saturating_sub(capacity.max(1));
    entries.drain(..overflow).collect()
}
