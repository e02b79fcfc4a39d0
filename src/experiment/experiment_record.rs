//! Experiment Record - one run behind a uniform read interface

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::export::{descriptor_entries, zip_path, ArchiveExport};
use super::record::Record;
use super::scalar_series::ScalarSeries;
use crate::backend::{ArtifactStore, Backend, BackendKind};
use crate::codec::encode;
use crate::resolver::{Identifier, ResolvedRun, Resolver};
use crate::store::{ArtifactReader, Document};
use crate::summary::{scalar_triples, EventLogReader, TfEventReader};
use crate::{Error, Result};

/// Substring marking an artifact as an event log.
pub const EVENTS_MARKER: &str = "events";
/// Substring marking an artifact as model weights.
pub const WEIGHTS_MARKER: &str = "weights";

/// Where to load model weights from.
pub enum Weights {
    /// File on disk, for directory-backed runs.
    Path(PathBuf),
    /// Open byte stream, for database-backed runs.
    Stream(ArtifactReader),
}

impl fmt::Debug for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A run opened from any backend.
///
/// Holds the backend handle, the raw run document, and its decoded form.
/// Artifacts are opened lazily on every request and never cached.
///
/// ## Example
///
/// ```rust,no_run
/// use labbook::{ExperimentRecord, Resolver, StoreConfig};
///
/// let resolver = Resolver::new(StoreConfig::from_env());
/// let run = ExperimentRecord::open(&resolver, std::path::Path::new("runs/17"))?;
/// let loss = run.get_summary("loss")?;
/// println!("{} loss points over steps {:?}", loss.len(), loss.steps());
/// # Ok::<(), labbook::Error>(())
/// ```
pub struct ExperimentRecord {
    backend: Backend,
    document: Document,
    record: Record,
    event_reader: Box<dyn EventLogReader>,
}

impl ExperimentRecord {
    /// Resolve `identifier` and load its record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no backend holds the run, or any load
    /// or decode error of the backend that does.
    pub fn open(resolver: &Resolver, identifier: impl Into<Identifier>) -> Result<Self> {
        let ResolvedRun { backend, document } = resolver.resolve(identifier)?;
        Self::from_backend(backend, document)
    }

    /// Wrap an opened backend and its raw run document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] if the document does not decode to a mapping.
    pub fn from_backend(backend: Backend, document: Document) -> Result<Self> {
        let record = Record::from_document(&document)?;
        Ok(Self {
            backend,
            document,
            record,
            event_reader: Box::new(TfEventReader::new()),
        })
    }

    /// Use a different event-log reader for [`get_summary`](Self::get_summary).
    #[must_use]
    pub fn with_event_reader(mut self, reader: Box<dyn EventLogReader>) -> Self {
        self.event_reader = reader;
        self
    }

    /// Kind of backend this run was loaded from.
    #[must_use]
    pub const fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Backend handle.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Known artifact names, in backend order.
    #[must_use]
    pub fn artifacts(&self) -> &[String] {
        self.backend.artifact_names()
    }

    /// Run id of a database-backed run.
    #[must_use]
    pub const fn run_id(&self) -> Option<u64> {
        match &self.backend {
            Backend::Database(db) => Some(db.run_id()),
            _ => None,
        }
    }

    /// Raw run document before type recovery.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Decoded record. The copy is independent of the handle.
    #[must_use]
    pub fn get_record(&self) -> Record {
        self.record.clone()
    }

    /// Open an artifact for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `name` is not a known artifact.
    pub fn get_artifact(&self, name: &str) -> Result<ArtifactReader> {
        if !self.artifacts().iter().any(|known| known == name) {
            return Err(Error::NotFound(format!("artifact {name}")));
        }
        self.backend.open_artifact(name)
    }

    /// Series of the scalar `tag` from the run's event log.
    ///
    /// The first artifact whose name contains `events` is copied to a scratch
    /// file and read completely; any malformed record fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no event-log artifact exists and
    /// [`Error::DecodeError`] if the log is malformed.
    pub fn get_summary(&self, tag: &str) -> Result<ScalarSeries> {
        let name = self.first_artifact(EVENTS_MARKER).ok_or_else(|| {
            Error::NotFound(format!("summary file: no artifact name contains {EVENTS_MARKER:?}"))
        })?;

        let mut scratch = NamedTempFile::new()?;
        let copied = io::copy(&mut self.get_artifact(name)?, scratch.as_file_mut())?;
        debug!(artifact = name, bytes = copied, "copied event log to scratch file");

        let mut series = ScalarSeries::new(tag);
        for triple in scalar_triples(self.event_reader.as_ref(), scratch.path())? {
            let triple = triple?;
            if triple.tag == tag {
                series.push(triple.step, triple.value);
            }
        }
        debug!(tag, points = series.len(), "extracted scalar summary");
        Ok(series)
    }

    /// Model weights: a file path for directory runs, a stream for database runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for zip-backed runs regardless of
    /// their artifacts, and [`Error::NotFound`] if no artifact name contains
    /// `weights`.
    pub fn get_weights(&self) -> Result<Weights> {
        if let Backend::Zip(zip) = &self.backend {
            return Err(Error::UnsupportedOperation(format!(
                "cannot load weights out of zip archive {}, extract it first",
                zip.path().display()
            )));
        }
        let name = self.first_artifact(WEIGHTS_MARKER).ok_or_else(|| {
            Error::NotFound(format!("weights: no artifact name contains {WEIGHTS_MARKER:?}"))
        })?;

        match &self.backend {
            Backend::Directory(dir) => Ok(Weights::Path(dir.artifact_path(name))),
            _ => Ok(Weights::Stream(self.get_artifact(name)?)),
        }
    }

    /// Export a database-backed run as a zip archive the zip backend can load.
    ///
    /// `.zip` is appended to `path` unless present. Artifacts are written
    /// first, then `config.json`, `cout.txt`, `info.json` and `run.json`. The
    /// archive only appears at its final path once every entry is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for other backends, and any
    /// blob or write failure.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let Backend::Database(db) = &self.backend else {
            return Err(self.database_only("dump"));
        };

        let target = zip_path(path.as_ref());
        let mut export = ArchiveExport::create(&target)?;
        for artifact in db.artifact_refs() {
            let mut reader = db.open_ref(artifact)?;
            export.add_reader(artifact.name(), &mut reader)?;
        }
        for (name, bytes) in descriptor_entries(&self.document)? {
            export.add_bytes(name, &bytes)?;
        }
        let target = export.finish()?;

        info!(run_id = db.run_id(), path = %target.display(), "dumped run");
        Ok(target)
    }

    /// Overwrite top-level fields and persist the whole record.
    ///
    /// The stored document is replaced by `_id`; there is no concurrency check,
    /// the last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for non-database runs before any
    /// storage is touched, and [`Error::NotFound`] if the stored document is gone.
    pub fn update_record(&mut self, changes: Record) -> Result<()> {
        let Backend::Database(db) = &self.backend else {
            return Err(self.database_only("update_record"));
        };

        let mut document = self.document.clone();
        for (key, value) in &changes {
            document.insert(key.clone(), encode(value));
        }
        let record = Record::from_document(&document)?;
        db.replace_record(document.clone())?;

        info!(run_id = db.run_id(), fields = changes.len(), "updated run record");
        self.document = document;
        self.record = record;
        Ok(())
    }

    fn first_artifact(&self, marker: &str) -> Option<&str> {
        self.artifacts()
            .iter()
            .find(|name| name.contains(marker))
            .map(String::as_str)
    }

    fn database_only(&self, operation: &str) -> Error {
        Error::UnsupportedOperation(format!(
            "{operation} needs a database-backed run, this one is {}",
            self.backend.kind()
        ))
    }
}

impl fmt::Debug for ExperimentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentRecord")
            .field("backend", &self.backend)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
