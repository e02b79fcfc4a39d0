//! Document and blob store collaborators
//!
//! The database backend talks to two external services through narrow
//! traits: a document store holding one run document per id, and a blob
//! store holding artifact bytes addressed by opaque ids.
//!
//! # Example
//!
//! ```rust
//! use labbook::store::{BlobStore, DocumentStore, MemoryDatabase};
//! use serde_json::json;
//! use std::io::Read;
//!
//! let db = MemoryDatabase::new();
//! let blob = db.put_blob(b"weights".to_vec());
//! db.insert_run(json!({"_id": 7, "artifacts": [{"name": "w.bin", "file_id": blob.to_json()}]}))?;
//!
//! assert!(db.find_one(7)?.is_some());
//! let mut bytes = Vec::new();
//! db.get(&blob)?.read_to_end(&mut bytes)?;
//! assert_eq!(bytes, b"weights");
//! # Ok::<(), labbook::Error>(())
//! ```

mod memory;

pub use memory::MemoryDatabase;

use std::fmt;
use std::io::Read;

use crate::config::DatabaseConfig;
use crate::{Error, Result};

/// A run document as stored in the database (extended JSON).
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Readable byte stream returned for artifacts.
pub type ArtifactReader = Box<dyn Read + Send>;

/// Key under which the document store keeps the run id.
pub const ID_KEY: &str = "_id";

/// Opaque handle of a blob in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(String);

impl BlobId {
    /// Wrap a raw blob id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a blob id from a document field: a plain string or `{"$oid": "..."}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] for any other shape.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Self(s.clone())),
            serde_json::Value::Object(map) => map
                .get("$oid")
                .and_then(serde_json::Value::as_str)
                .map(|s| Self(s.to_string()))
                .ok_or_else(|| Error::DecodeError(format!("unrecognized file_id {value}"))),
            other => Err(Error::DecodeError(format!("unrecognized file_id {other}"))),
        }
    }

    /// Extended-JSON form, `{"$oid": "..."}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("$oid".to_string(), serde_json::Value::from(self.0.clone()));
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collection of run documents keyed by run id.
pub trait DocumentStore: Send + Sync {
    /// Fetch the document with `_id == run_id`.
    ///
    /// Returns `None` if there is no such document.
    fn find_one(&self, run_id: u64) -> Result<Option<Document>>;

    /// Replace the whole document with `_id == run_id`.
    ///
    /// Returns `false` if no document matched.
    fn replace_one(&self, run_id: u64, document: Document) -> Result<bool>;
}

/// Blob storage addressed by ids found in run documents.
pub trait BlobStore: Send + Sync {
    /// Open a blob for reading.
    fn get(&self, id: &BlobId) -> Result<ArtifactReader>;
}

/// One database connection: a document store paired with its blob store.
pub struct DatabaseConnection {
    documents: Box<dyn DocumentStore>,
    blobs: Box<dyn BlobStore>,
}

impl DatabaseConnection {
    /// Pair a document store with a blob store.
    #[must_use]
    pub fn new(documents: Box<dyn DocumentStore>, blobs: Box<dyn BlobStore>) -> Self {
        Self { documents, blobs }
    }

    /// Document store half.
    #[must_use]
    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    /// Blob store half.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }
}

impl fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConnection").finish_non_exhaustive()
    }
}

/// Opens connections for a configured database.
pub trait DatabaseConnector: Send + Sync {
    /// Connect using the given credentials.
    fn connect(&self, config: &DatabaseConfig) -> Result<DatabaseConnection>;
}
