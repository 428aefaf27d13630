/*!
 * Batch checkpoint store.
 *
 * `process.json` maps a chunk range key (`"{start}_{end}"`) to the validated
 * result of that chunk, so an interrupted phase can resume without calling
 * the translation service again for completed chunks. Each entry carries a
 * digest of the chunk's texts and languages; an entry whose digest does not
 * match the chunk being translated is ignored.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::errors::CacheError;
use crate::file_utils::FileManager;

use super::response::BatchPayload;

/// File name of the checkpoint store inside the cache directory
pub const PROCESS_FILE_NAME: &str = "process.json";

/// One persisted chunk result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointEntry {
    /// Digest of the chunk's texts and languages
    pub digest: String,
    /// Per-language translations of the chunk
    pub result: BatchPayload,
}

/// Range key of a chunk within the current text list
pub fn range_key(start: usize, end: usize) -> String {
    format!("{}_{}", start, end)
}

/// Digest identifying the exact input of a chunk
pub fn chunk_digest(texts: &[String], languages: &[String]) -> String {
    let mut hasher = Sha256::new();
    for language in languages {
        hasher.update(language.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update([1u8]);
    for text in texts {
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Checkpoint store scoped to one batch phase
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CheckpointEntry>>,
}

impl CheckpointStore {
    /// Open the store in `cache_dir`, reading entries left by an interrupted phase
    pub async fn open(cache_dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = cache_dir.as_ref().join(PROCESS_FILE_NAME);

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let entries: BTreeMap<String, CheckpointEntry> = serde_json::from_str(&content)
                    .map_err(|e| CacheError::Corrupt {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                debug!("Resuming with {} checkpointed batch(es)", entries.len());
                entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(CacheError::Io {
                    path,
                    message: e.to_string(),
                });
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the persisted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries held
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Stored result for a chunk, if its digest matches
    pub async fn get(&self, key: &str, texts: &[String], languages: &[String]) -> Option<BatchPayload> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;

        if entry.digest != chunk_digest(texts, languages) {
            warn!("Ignoring stale checkpoint for batch {}", key);
            return None;
        }
        Some(entry.result.clone())
    }

    /// Persist a chunk result immediately
    pub async fn record(
        &self,
        key: &str,
        texts: &[String],
        languages: &[String],
        result: &BatchPayload,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            CheckpointEntry {
                digest: chunk_digest(texts, languages),
                result: result.clone(),
            },
        );

        let content = serde_json::to_string(&*entries).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        FileManager::write_atomic(&self.path, &content).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Delete the persisted store at the end of a phase
    pub async fn clear(self) -> Result<(), CacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: self.path,
                message: e.to_string(),
            }),
        }
    }
}
