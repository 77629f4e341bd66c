// src/store.rs

//! Whole-document JSON persistence for the Users, Quizzes and Results
//! collections.
//!
//! Each collection lives in one file holding a JSON array. Writes never touch
//! the target in place: the full content goes to a uniquely named temporary
//! file in the same directory, is flushed to disk, and is then renamed over
//! the target, so readers only ever see the old or the new document.
//!
//! Concurrency: plain [`DocumentStore::read`] followed by
//! [`DocumentStore::write`] keeps whole-document semantics, and two such
//! pairs racing on one collection lose the first writer's change.
//! [`DocumentStore::update`] serializes read-modify-write per collection
//! inside this process and is what the core mutators use.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::{
    quiz::Quiz,
    result::QuizResult,
    user::{LegacyUser, User},
};
use crate::normalizer::normalize;

/// The named collections known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Quizzes,
    Results,
}

impl Collection {
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::Quizzes => "quizzes.json",
            Collection::Results => "results.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Stored bytes are not a JSON array of the expected record shape.
    /// The file is left exactly as found.
    #[error("collection {collection} holds corrupt data: {source}")]
    CorruptData {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    /// Storage I/O failed. No partially written document is ever visible.
    #[error("persistence failure on collection {collection}: {source}")]
    Persistence {
        collection: Collection,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(collection: Collection, source: io::Error) -> Self {
        StoreError::Persistence { collection, source }
    }
}

/// A record type stored as one collection.
///
/// `Stored` is the on-disk shape accepted by reads; `from_stored` turns it
/// into the in-memory record and reports whether anything had to be repaired.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    type Stored: DeserializeOwned;

    fn from_stored(stored: Self::Stored) -> (Self, bool);
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    type Stored = LegacyUser;

    fn from_stored(stored: LegacyUser) -> (Self, bool) {
        let normalized = normalize(stored);
        (normalized.user, normalized.repaired)
    }
}

impl Document for Quiz {
    const COLLECTION: Collection = Collection::Quizzes;

    type Stored = Quiz;

    fn from_stored(stored: Quiz) -> (Self, bool) {
        (stored, false)
    }
}

impl Document for QuizResult {
    const COLLECTION: Collection = Collection::Results;

    type Stored = QuizResult;

    fn from_stored(stored: QuizResult) -> (Self, bool) {
        (stored, false)
    }
}

struct Inner {
    dir: PathBuf,
    users: Mutex<()>,
    quizzes: Mutex<()>,
    results: Mutex<()>,
}

/// Handle to the collection files under one data directory.
/// Cheap to clone; clones share the per-collection write locks.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<Inner>,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir: dir.into(),
                users: Mutex::new(()),
                quizzes: Mutex::new(()),
                results: Mutex::new(()),
            }),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.inner.dir.join(collection.file_name())
    }

    fn lock(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Users => &self.inner.users,
            Collection::Quizzes => &self.inner.quizzes,
            Collection::Results => &self.inner.results,
        }
    }

    /// Reads a whole collection, creating it as `[]` when it does not exist.
    ///
    /// For Users, every record is normalized; if any record was repaired the
    /// normalized collection is persisted before it is returned.
    pub async fn read<T: Document>(&self) -> Result<Vec<T>, StoreError> {
        let (docs, repaired) = self.load::<T>().await?;
        if !repaired {
            return Ok(docs);
        }

        // Re-read under the lock so the heal cannot overwrite a concurrent update.
        let _guard = self.lock(T::COLLECTION).lock().await;
        let (docs, repaired) = self.load::<T>().await?;
        if repaired {
            let collection = T::COLLECTION;
            self.persist(collection, &docs).await?;
            tracing::info!(
                collection = %collection,
                records = docs.len(),
                "Repaired legacy records during read"
            );
        }
        Ok(docs)
    }

    /// Replaces a whole collection atomically.
    pub async fn write<T: Document>(&self, docs: &[T]) -> Result<(), StoreError> {
        let _guard = self.lock(T::COLLECTION).lock().await;
        self.persist(T::COLLECTION, docs).await
    }

    /// Read-modify-write of one collection, serialized against every other
    /// `update`, `write` and self-healing read of the same collection.
    ///
    /// The collection is written back only when `f` succeeds. If `f` fails
    /// and the read had to repair records, the repaired (unmodified)
    /// collection is still persisted, matching what `read` would have done.
    pub async fn update<T, R, E, F>(&self, f: F) -> Result<R, E>
    where
        T: Document,
        E: From<StoreError>,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
    {
        let _guard = self.lock(T::COLLECTION).lock().await;
        let (mut docs, repaired) = self.load::<T>().await?;
        let healed = repaired.then(|| docs.clone());

        match f(&mut docs) {
            Ok(out) => {
                self.persist(T::COLLECTION, &docs).await?;
                Ok(out)
            }
            Err(err) => {
                if let Some(healed) = healed {
                    self.persist(T::COLLECTION, &healed).await?;
                }
                Err(err)
            }
        }
    }

    /// Creates every missing collection file. Used at start-up.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        self.read::<User>().await?;
        self.read::<Quiz>().await?;
        self.read::<QuizResult>().await?;
        Ok(())
    }

    async fn load<T: Document>(&self) -> Result<(Vec<T>, bool), StoreError> {
        let collection = T::COLLECTION;
        let raw = match self.read_bytes(collection).await? {
            Some(raw) => raw,
            None => return Ok((Vec::new(), false)),
        };

        let stored: Vec<T::Stored> = serde_json::from_slice(&raw)
            .map_err(|source| StoreError::CorruptData { collection, source })?;

        let mut repaired = false;
        let docs = stored
            .into_iter()
            .map(|s| {
                let (doc, fixed) = T::from_stored(s);
                repaired |= fixed;
                doc
            })
            .collect();
        Ok((docs, repaired))
    }

    /// Returns the file content, or `None` after bootstrapping an empty
    /// collection that did not exist yet.
    async fn read_bytes(&self, collection: Collection) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path(collection);
        match fs::read(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.create_if_absent(collection).await? {
                    tracing::debug!(collection = %collection, "Created empty collection");
                    return Ok(None);
                }
                // Another task created it first; read what it wrote.
                fs::read(&path)
                    .await
                    .map(Some)
                    .map_err(|e| StoreError::io(collection, e))
            }
            Err(e) => Err(StoreError::io(collection, e)),
        }
    }

    /// Publishes `[]` at the collection path unless something already exists
    /// there. The hard link either creates the fully written file or fails
    /// with `AlreadyExists`, so concurrent first reads never see an empty or
    /// half-written file and never overwrite each other.
    async fn create_if_absent(&self, collection: Collection) -> Result<bool, StoreError> {
        let staged = self.stage::<serde_json::Value>(collection, &[]).await?;
        let linked = fs::hard_link(&staged.temp_path, &staged.target).await;
        staged.abandon().await;

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StoreError::io(collection, e)),
        }
    }

    async fn persist<T: Serialize>(&self, collection: Collection, docs: &[T]) -> Result<(), StoreError> {
        self.stage(collection, docs).await?.commit().await
    }

    /// Writes the serialized collection to a fresh temporary file next to
    /// the target and syncs it. Nothing is visible at the target yet.
    async fn stage<T: Serialize>(
        &self,
        collection: Collection,
        docs: &[T],
    ) -> Result<StagedWrite, StoreError> {
        let body = serde_json::to_vec_pretty(docs)
            .map_err(|e| StoreError::io(collection, io::Error::other(e)))?;

        fs::create_dir_all(&self.inner.dir)
            .await
            .map_err(|e| StoreError::io(collection, e))?;

        let staged = StagedWrite {
            collection,
            temp_path: self.inner.dir.join(format!(
                ".{}.{}.tmp",
                collection.file_name(),
                uuid::Uuid::new_v4().simple()
            )),
            target: self.path(collection),
        };

        if let Err(e) = write_synced(&staged.temp_path, &body).await {
            staged.abandon().await;
            return Err(StoreError::io(collection, e));
        }
        Ok(staged)
    }
}

async fn write_synced(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    Ok(())
}

/// A fully written temporary file waiting to replace its collection.
struct StagedWrite {
    collection: Collection,
    temp_path: PathBuf,
    target: PathBuf,
}

impl StagedWrite {
    async fn commit(self) -> Result<(), StoreError> {
        match fs::rename(&self.temp_path, &self.target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let collection = self.collection;
                self.abandon().await;
                Err(StoreError::io(collection, e))
            }
        }
    }

    async fn abandon(self) {
        if let Err(e) = fs::remove_file(&self.temp_path).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.temp_path.display(), "Failed to remove temp file: {}", e);
            }
        }
    }
}
