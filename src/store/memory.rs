//! In-memory document and blob store using `DashMap`.
//!
//! Data is lost on process restart. Clones share the same underlying maps,
//! so a connection handed out by [`DatabaseConnector::connect`] sees every
//! write made through the original handle.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use super::{
    ArtifactReader, BlobId, BlobStore, DatabaseConnection, DatabaseConnector, Document,
    DocumentStore, ID_KEY,
};
use crate::config::DatabaseConfig;
use crate::{Error, Result};

/// In-memory database implementing both collaborator traits.
///
/// # Example
///
/// ```rust
/// use labbook::store::{DocumentStore, MemoryDatabase};
/// use serde_json::json;
///
/// let db = MemoryDatabase::new();
/// db.insert_run(json!({"_id": 1, "status": "RUNNING"}))?;
/// assert_eq!(db.find_one(1)?.unwrap()["status"], "RUNNING");
/// # Ok::<(), labbook::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    runs: Arc<DashMap<u64, Document>>,
    blobs: Arc<DashMap<BlobId, Vec<u8>, FxBuildHasher>>,
    next_blob: Arc<AtomicU64>,
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a run document; its `_id` must be an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] if the document is not an object or lacks `_id`.
    pub fn insert_run(&self, document: serde_json::Value) -> Result<u64> {
        let serde_json::Value::Object(document) = document else {
            return Err(Error::DecodeError("run document must be an object".to_string()));
        };
        let run_id = document
            .get(ID_KEY)
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::DecodeError("run document needs an integer _id".to_string()))?;
        self.runs.insert(run_id, document);
        Ok(run_id)
    }

    /// Store bytes under a fresh blob id.
    pub fn put_blob(&self, bytes: Vec<u8>) -> BlobId {
        let n = self.next_blob.fetch_add(1, Ordering::Relaxed);
        let id = BlobId::new(format!("{n:024x}"));
        self.blobs.insert(id.clone(), bytes);
        id
    }

    /// Snapshot of a stored run document.
    #[must_use]
    pub fn run(&self, run_id: u64) -> Option<Document> {
        self.runs.get(&run_id).map(|doc| doc.value().clone())
    }

    /// Number of stored run documents.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

impl DocumentStore for MemoryDatabase {
    fn find_one(&self, run_id: u64) -> Result<Option<Document>> {
        Ok(self.run(run_id))
    }

    fn replace_one(&self, run_id: u64, document: Document) -> Result<bool> {
        match self.runs.get_mut(&run_id) {
            Some(mut slot) => {
                *slot = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl BlobStore for MemoryDatabase {
    fn get(&self, id: &BlobId) -> Result<ArtifactReader> {
        let bytes = self
            .blobs
            .get(id)
            .map(|b| b.value().clone())
            .ok_or_else(|| Error::NotFound(format!("blob {id}")))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

impl DatabaseConnector for MemoryDatabase {
    fn connect(&self, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        debug!(host = %config.host, database = %config.name, "connecting to in-memory database");
        Ok(DatabaseConnection::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
        ))
    }
}
