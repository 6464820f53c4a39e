use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::encoder::extension_for_mime;

/// Descriptive part of an artifact, without the encoded bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    /// Encoded size in bytes
    pub size: u64,
    /// Active recording time (paused spans excluded)
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl ArtifactMeta {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// A finished recording. Cheap to clone; contents never change.
#[derive(Debug, Clone)]
pub struct Artifact {
    meta: ArtifactMeta,
    bytes: Arc<Vec<u8>>,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, mime_type: &str, duration: Duration) -> Self {
        let created_at = Utc::now();
        let filename = format!(
            "recording_{}{}",
            created_at.timestamp_millis(),
            extension_for_mime(mime_type)
        );

        Self {
            meta: ArtifactMeta {
                id: Uuid::new_v4(),
                filename,
                mime_type: mime_type.to_string(),
                size: bytes.len() as u64,
                duration_ms: duration.as_millis() as u64,
                created_at,
            },
            bytes: Arc::new(bytes),
        }
    }

    pub(crate) fn from_parts(meta: ArtifactMeta, bytes: Vec<u8>) -> Self {
        Self {
            meta,
            bytes: Arc::new(bytes),
        }
    }

    pub fn meta(&self) -> &ArtifactMeta {
        &self.meta
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    pub fn filename(&self) -> &str {
        &self.meta.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.meta.mime_type
    }

    pub fn size(&self) -> u64 {
        self.meta.size
    }

    pub fn duration(&self) -> Duration {
        self.meta.duration()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Human-readable size, e.g. `1.5 KB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
