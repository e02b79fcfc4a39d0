//! Database backend: run document in a document store, artifacts in a blob store

use tracing::debug;

use super::{ArtifactStore, ARTIFACTS_KEY};
use crate::store::{ArtifactReader, BlobId, DatabaseConnection, Document};
use crate::{Error, Result};

/// Name and blob handle of one database artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    name: String,
    file_id: BlobId,
}

impl ArtifactRef {
    /// Create an artifact reference.
    #[must_use]
    pub fn new(name: impl Into<String>, file_id: BlobId) -> Self {
        Self {
            name: name.into(),
            file_id,
        }
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blob handle.
    #[must_use]
    pub const fn file_id(&self) -> &BlobId {
        &self.file_id
    }
}

/// A run held in the document database; owns its connection.
#[derive(Debug)]
pub struct DatabaseBackend {
    connection: DatabaseConnection,
    run_id: u64,
    refs: Vec<ArtifactRef>,
    names: Vec<String>,
}

impl DatabaseBackend {
    /// Look up a run document; `None` if the store has no such run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] if the document's `artifacts` field is
    /// malformed, or whatever the document store reports.
    pub fn open(connection: DatabaseConnection, run_id: u64) -> Result<Option<(Self, Document)>> {
        let Some(document) = connection.documents().find_one(run_id)? else {
            return Ok(None);
        };
        let refs = artifact_refs(&document)?;
        let names = refs.iter().map(|r| r.name.clone()).collect();

        debug!(run_id, artifacts = refs.len(), "loaded run document");
        Ok(Some((
            Self {
                connection,
                run_id,
                refs,
                names,
            },
            document,
        )))
    }

    /// Run id the document is stored under.
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Artifact references in document order.
    #[must_use]
    pub fn artifact_refs(&self) -> &[ArtifactRef] {
        &self.refs
    }

    /// Open the blob behind an artifact reference.
    ///
    /// # Errors
    ///
    /// Returns whatever the blob store reports, typically [`Error::NotFound`].
    pub fn open_ref(&self, artifact: &ArtifactRef) -> Result<ArtifactReader> {
        self.connection.blobs().get(&artifact.file_id)
    }

    /// Replace the stored document with `document`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run disappeared from the store.
    pub fn replace_record(&self, document: Document) -> Result<()> {
        if self.connection.documents().replace_one(self.run_id, document)? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("run {} in document store", self.run_id)))
        }
    }
}

impl ArtifactStore for DatabaseBackend {
    fn artifact_names(&self) -> &[String] {
        &self.names
    }

    fn open_artifact(&self, name: &str) -> Result<ArtifactReader> {
        let artifact = self
            .refs
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NotFound(format!("artifact {name}")))?;
        self.open_ref(artifact)
    }
}

/// Parse the `artifacts` field: a list of `{name, file_id}` objects.
fn artifact_refs(document: &Document) -> Result<Vec<ArtifactRef>> {
    let Some(field) = document.get(ARTIFACTS_KEY) else {
        return Ok(Vec::new());
    };
    let items = field
        .as_array()
        .ok_or_else(|| Error::DecodeError("artifacts must be a list".to_string()))?;

    items
        .iter()
        .map(|item| {
            let name = item
                .get("name")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| Error::DecodeError("artifact without a name".to_string()))?;
            let file_id = item
                .get("file_id")
                .ok_or_else(|| Error::DecodeError(format!("artifact {name} without a file_id")))?;
            Ok(ArtifactRef::new(name, BlobId::from_json(file_id)?))
        })
        .collect()
}
