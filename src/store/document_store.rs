//! JSON document store with one store-wide critical section.
//!
//! Each collection is a JSON array in `<root>/<collection>.json`. Every
//! operation on a [`DocumentStore`] holds the same async mutex, so callers
//! from the poll loop and from inbound chat tasks serialize. Collections
//! are small and touched about once per user action or poll cycle, so a
//! single lock is enough.
//!
//! Writes go to a temporary sibling first and are moved into place with a
//! rename, so a failed write leaves the previous content intact.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::NotifierError;

/// Concurrency-safe store of named, untyped record collections.
#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, NotifierError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| NotifierError::store("<root>", format!("{}: {e}", root.display())))?;
        tracing::debug!(root = %root.display(), "document store opened");
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every record of `collection`.
    ///
    /// A collection that was never written is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the file exists but cannot be
    /// read or parsed, or if the collection name is not a plain file name.
    pub async fn load<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, NotifierError> {
        let path = self.collection_path(collection)?;
        let _guard = self.lock.lock().await;
        read_collection(collection, &path).await
    }

    /// Loads `collection`, logging and returning an empty list on failure.
    pub async fn load_or_empty<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        match self.load(collection).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(collection, error = %e, "failed to load collection, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replaces the content of `collection` with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on serialization or I/O failure; the
    /// previously durable content is left untouched in that case.
    pub async fn save<T: Serialize>(
        &self,
        collection: &str,
        records: &[T],
    ) -> Result<(), NotifierError> {
        let path = self.collection_path(collection)?;
        let _guard = self.lock.lock().await;
        write_collection(collection, &path, records).await
    }

    /// Appends `record` to `collection` as one atomic load-append-save.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the existing content cannot be
    /// read or the new content cannot be written.
    pub async fn append<T>(&self, collection: &str, record: T) -> Result<(), NotifierError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.update(collection, |records: &mut Vec<T>| records.push(record))
            .await
    }

    /// Runs `mutate` on the loaded records and saves the result, all under
    /// the store lock. Returns whatever `mutate` returns.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if reading or writing fails. A read
    /// failure aborts before `mutate` runs, so unreadable content is never
    /// overwritten.
    pub async fn update<T, R, F>(&self, collection: &str, mutate: F) -> Result<R, NotifierError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let path = self.collection_path(collection)?;
        let _guard = self.lock.lock().await;
        let mut records = read_collection(collection, &path).await?;
        let result = mutate(&mut records);
        write_collection(collection, &path, &records).await?;
        Ok(result)
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, NotifierError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(NotifierError::store(collection, "invalid collection name"));
        }
        Ok(self.root.join(format!("{collection}.json")))
    }
}

async fn read_collection<T: DeserializeOwned>(
    collection: &str,
    path: &Path,
) -> Result<Vec<T>, NotifierError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(NotifierError::store(collection, e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| NotifierError::store(collection, e))
}

async fn write_collection<T: Serialize>(
    collection: &str,
    path: &Path,
    records: &[T],
) -> Result<(), NotifierError> {
    let json =
        serde_json::to_vec_pretty(records).map_err(|e| NotifierError::store(collection, e))?;
    let tmp_path = path.with_extension("json.tmp");

    let write = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    };

    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        tracing::error!(collection, error = %e, "failed to write collection");
        return Err(NotifierError::store(collection, e));
    }

    tracing::debug!(collection, records = records.len(), "collection saved");
    Ok(())
}
