use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use super::{evict_overflow, RecordingStore, StoreError};
use crate::session::{Artifact, ArtifactMeta};

const INDEX_FILE: &str = "index.json";

/// Directory-backed store
///
/// Layout: `index.json` holds the metadata list (oldest first) and each
/// recording's bytes live in `<id>-<filename>` next to it.
pub struct FileStore {
    root: PathBuf,
    capacity: usize,
    // Serializes index read-modify-write cycles.
    index_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>, capacity: usize) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        info!(
            "Recording store opened at {} (capacity: {})",
            root.display(),
            capacity
        );

        Ok(Self {
            root,
            capacity,
            index_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn blob_path(&self, meta: &ArtifactMeta) -> PathBuf {
        self.root.join(format!("{}-{}", meta.id, meta.filename))
    }

    fn read_index(&self) -> Result<Vec<ArtifactMeta>, StoreError> {
        match fs::read(self.index_path()) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_index(&self, index: &[ArtifactMeta]) -> Result<(), StoreError> {
        let tmp = self.root.join(format!("{}.tmp", INDEX_FILE));
        fs::write(&tmp, serde_json::to_vec_pretty(index)?)?;
        fs::rename(&tmp, self.index_path())?;
        Ok(())
    }

    fn append_to_index(&self, meta: ArtifactMeta) -> Result<Vec<ArtifactMeta>, StoreError> {
        let mut index = self.read_index()?;
        index.push(meta);
        let evicted = evict_overflow(&mut index, self.capacity);
        self.write_index(&index)?;
        Ok(evicted)
    }

    fn remove_blob(&self, meta: &ArtifactMeta) {
        if let Err(err) = fs::remove_file(self.blob_path(meta)) {
            if err.kind() != ErrorKind::NotFound {
                warn!("Failed to remove data for recording {}: {}", meta.id, err);
            }
        }
    }
}

impl RecordingStore for FileStore {
    fn save(&self, artifact: &Artifact) -> Result<Vec<ArtifactMeta>, StoreError> {
        let _guard = self.index_lock.lock();

        let meta = artifact.meta().clone();
        fs::write(self.blob_path(&meta), artifact.bytes())?;

        // The blob is only reachable through the index.
        let evicted = match self.append_to_index(meta.clone()) {
            Ok(evicted) => evicted,
            Err(err) => {
                self.remove_blob(&meta);
                return Err(err);
            }
        };

        for old in &evicted {
            self.remove_blob(old);
        }

        Ok(evicted)
    }

    fn list(&self) -> Result<Vec<ArtifactMeta>, StoreError> {
        let _guard = self.index_lock.lock();
        self.read_index()
    }

    fn get(&self, id: Uuid) -> Result<Option<Artifact>, StoreError> {
        let _guard = self.index_lock.lock();

        let Some(meta) = self.read_index()?.into_iter().find(|meta| meta.id == id) else {
            return Ok(None);
        };

        match fs::read(self.blob_path(&meta)) {
            Ok(bytes) => Ok(Some(Artifact::from_parts(meta, bytes))),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::MissingData(id)),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.index_lock.lock();

        let mut index = self.read_index()?;
        let Some(position) = index.iter().position(|meta| meta.id == id) else {
            return Ok(false);
        };

        let removed = index.remove(position);
        self.write_index(&index)?;
        self.remove_blob(&removed);

        Ok(true)
    }
}
