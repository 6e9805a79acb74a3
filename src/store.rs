//! Persistence for sightings submitted from this device.
//!
//! The local collection lives under a single storage key as one JSON array,
//! kept in insertion order. A missing key reads as an empty collection; a
//! payload that is present but unreadable is reported, never discarded.
//! Appends are serialized per storage location so concurrent submissions
//! cannot overwrite each other.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError};

use async_trait::async_trait;
use log::{debug, info};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{Result, SightingError};
use crate::record::Sighting;

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Sighting>>;

    /// Appends one record as a single read-modify-write. Fails with
    /// [`SightingError::Concurrency`] if the id is already stored.
    async fn append(&self, sighting: Sighting) -> Result<()>;
}

fn decode(origin: &str, payload: &[u8]) -> Result<Vec<Sighting>> {
    serde_json::from_slice(payload).map_err(|e| SightingError::parse(origin, e))
}

fn push_unique(collection: &mut Vec<Sighting>, sighting: Sighting) -> Result<()> {
    if collection.iter().any(|s| s.id == sighting.id) {
        return Err(SightingError::Concurrency(sighting.id));
    }
    collection.push(sighting);
    Ok(())
}

/// Append locks shared by every `FileStore` in the process, keyed by file.
fn append_lock(path: &Path) -> Arc<Mutex<()>> {
    type Registry = std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;
    static LOCKS: OnceLock<Registry> = OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

/// Stores the collection in `<data_dir>/<key>.json`.
///
/// Stores opened on the same file share one append lock, so any number of
/// instances in a process may write the same key. Other processes writing
/// the file are not coordinated with.
pub struct FileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>, key: &str) -> Self {
        let path = data_dir.as_ref().join(format!("{key}.json"));
        Self {
            write_lock: append_lock(&path),
            path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir, &config.storage_key)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Sighting>> {
        match fs::read(&self.path).await {
            Ok(payload) => decode(&self.path.display().to_string(), &payload),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("No local collection at {}", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(SightingError::storage(&self.path, e)),
        }
    }

    /// Replaces the file through a sibling temp file, flushed to disk before
    /// the rename, so readers never see a partial write.
    async fn write(&self, collection: &[Sighting]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SightingError::storage(parent, e))?;
        }

        let payload = serde_json::to_vec_pretty(collection)
            .map_err(|e| SightingError::parse(self.path.display().to_string(), e))?;
        let staging = self.path.with_extension("json.tmp");
        let mut file = File::create(&staging)
            .await
            .map_err(|e| SightingError::storage(&staging, e))?;
        file.write_all(&payload)
            .await
            .map_err(|e| SightingError::storage(&staging, e))?;
        file.sync_all()
            .await
            .map_err(|e| SightingError::storage(&staging, e))?;
        drop(file);
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| SightingError::storage(&self.path, e))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn load(&self) -> Result<Vec<Sighting>> {
        self.read().await
    }

    async fn append(&self, sighting: Sighting) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut collection = self.read().await?;
        let id = sighting.id;
        push_unique(&mut collection, sighting)?;
        self.write(&collection).await?;

        info!(
            "Stored sighting {} ({} local records) in {}",
            id,
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store holding the raw serialized payload, as a key-value
/// backend would.
#[derive(Default)]
pub struct MemoryStore {
    payload: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sightings(sightings: &[Sighting]) -> Result<Self> {
        let payload =
            serde_json::to_string(sightings).map_err(|e| SightingError::parse("memory", e))?;
        Ok(Self::with_raw(payload))
    }

    /// Seeds the store with an arbitrary payload, valid or not.
    pub fn with_raw(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }

    pub async fn raw(&self) -> Option<String> {
        self.payload.lock().await.clone()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Sighting>> {
        match self.payload.lock().await.as_deref() {
            Some(raw) => decode("memory", raw.as_bytes()),
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, sighting: Sighting) -> Result<()> {
        let mut payload = self.payload.lock().await;

        let mut collection = match payload.as_deref() {
            Some(raw) => decode("memory", raw.as_bytes())?,
            None => Vec::new(),
        };
        push_unique(&mut collection, sighting)?;
        *payload =
            Some(serde_json::to_string(&collection).map_err(|e| SightingError::parse("memory", e))?);
        Ok(())
    }
}
