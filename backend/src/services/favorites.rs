use std::{
    collections::HashSet,
    fs,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;

use crate::titles::SummaryRecord;

/// Name of the durable slot holding the favorites list.
pub const FAVORITES_SLOT: &str = "favorites";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("favorites storage i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable backing for the favorites list: one opaque blob, replaced whole.
pub trait FavoritesStorage: Send + Sync {
    /// Current contents, or `None` when nothing was ever written.
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// JSON file storage under the data directory.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let mut path = data_dir.into();
        path.push(format!("{FAVORITES_SLOT}.json"));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for FileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension(format!(
            "{}.tmp",
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        fs::write(&tmp_path, bytes)?;
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }
}

/// In-memory storage, handy for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bytes: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl FavoritesStorage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        *self.bytes.lock() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Persistent, insertion-ordered set of favorite titles keyed by id.
///
/// Every `add`/`remove` rewrites the whole list to storage while holding the
/// lock, so the in-memory copy and the durable copy move together.
pub struct FavoritesStore {
    storage: Arc<dyn FavoritesStorage>,
    entries: Mutex<Vec<SummaryRecord>>,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("entries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl FavoritesStore {
    /// Hydrate from storage. Unreadable or malformed data yields an empty set.
    pub fn load(storage: Arc<dyn FavoritesStorage>) -> Self {
        let entries = match storage.read() {
            Ok(Some(bytes)) => decode(&bytes),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read favorites, starting empty");
                Vec::new()
            }
        };
        tracing::info!(count = entries.len(), "favorites loaded");

        Self {
            storage,
            entries: Mutex::new(entries),
        }
    }

    /// Insert `record` unless its id is already present. Returns whether it was inserted.
    pub fn add(&self, record: SummaryRecord) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock();
        let inserted = !entries.iter().any(|entry| entry.id == record.id);
        if inserted {
            entries.push(record);
        }
        self.persist(&entries)?;
        Ok(inserted)
    }

    /// Delete the entry for `id` if present. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        self.persist(&entries)?;
        Ok(removed)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().iter().any(|entry| entry.id == id)
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<SummaryRecord> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &[SummaryRecord]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(entries)?;
        self.storage.write(&bytes).inspect_err(|err| {
            tracing::error!(error = %err, "failed to persist favorites");
        })
    }
}

fn decode(bytes: &[u8]) -> Vec<SummaryRecord> {
    match serde_json::from_slice::<Vec<SummaryRecord>>(bytes) {
        Ok(records) => {
            let mut seen = HashSet::new();
            records
                .into_iter()
                .filter(|record| seen.insert(record.id.clone()))
                .collect()
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored favorites are malformed, starting empty");
            Vec::new()
        }
    }
}
