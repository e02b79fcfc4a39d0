//! Physical storage backends for a run
//!
//! A run lives in exactly one of three places. Each backend knows its artifact
//! names and how to open one of them; [`Backend`] is the closed set the rest of
//! the crate dispatches on.
//!
//! ```text
//! Database   document store + blob store, artifacts addressed by file_id
//! Directory  run.json, info.json, config.json, cout.txt + artifact files
//! Zip        same four entries + artifact entries inside one archive
//! ```

mod archive;
mod database;
mod directory;

pub use archive::ZipBackend;
pub use database::{ArtifactRef, DatabaseBackend};
pub use directory::DirectoryBackend;

use std::fmt;

use tracing::warn;

use crate::codec::parse_object;
use crate::store::{ArtifactReader, Document};
use crate::Result;

/// Run descriptor file: everything except config, info and captured output.
pub const RUN_FILE: &str = "run.json";
/// Info descriptor file.
pub const INFO_FILE: &str = "info.json";
/// Config descriptor file.
pub const CONFIG_FILE: &str = "config.json";
/// Captured stdout/stderr of the run.
pub const CAPTURED_OUT_FILE: &str = "cout.txt";

/// The four descriptor files every directory or zip run carries.
pub const DESCRIPTOR_FILES: [&str; 4] = [RUN_FILE, INFO_FILE, CONFIG_FILE, CAPTURED_OUT_FILE];

/// Record key of the config sub-mapping.
pub const CONFIG_KEY: &str = "config";
/// Record key of the info sub-mapping.
pub const INFO_KEY: &str = "info";
/// Record key of the captured output text.
pub const CAPTURED_OUT_KEY: &str = "captured_out";
/// Record key of the artifact list.
pub const ARTIFACTS_KEY: &str = "artifacts";

/// Access to the artifacts of one run.
pub trait ArtifactStore {
    /// Artifact names in backend order.
    fn artifact_names(&self) -> &[String];

    /// Open an artifact for reading. Every call opens the resource afresh.
    fn open_artifact(&self, name: &str) -> Result<ArtifactReader>;
}

/// Which kind of backend holds a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Document database with blob storage.
    Database,
    /// Plain directory on disk.
    Directory,
    /// Zip archive.
    Zip,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "database",
            Self::Directory => "directory",
            Self::Zip => "zip",
        })
    }
}

/// The backend a run was resolved to, carrying only its own handles.
#[derive(Debug)]
pub enum Backend {
    /// Database-backed run.
    Database(DatabaseBackend),
    /// Directory-backed run.
    Directory(DirectoryBackend),
    /// Zip-backed run.
    Zip(ZipBackend),
}

impl Backend {
    /// Kind of this backend.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Database(_) => BackendKind::Database,
            Self::Directory(_) => BackendKind::Directory,
            Self::Zip(_) => BackendKind::Zip,
        }
    }
}

impl ArtifactStore for Backend {
    fn artifact_names(&self) -> &[String] {
        match self {
            Self::Database(b) => b.artifact_names(),
            Self::Directory(b) => b.artifact_names(),
            Self::Zip(b) => b.artifact_names(),
        }
    }

    fn open_artifact(&self, name: &str) -> Result<ArtifactReader> {
        match self {
            Self::Database(b) => b.open_artifact(name),
            Self::Directory(b) => b.open_artifact(name),
            Self::Zip(b) => b.open_artifact(name),
        }
    }
}

/// Raw contents of the four descriptor files.
pub(crate) struct Descriptors {
    pub run: String,
    pub info: String,
    pub config: String,
    pub captured_out: Vec<u8>,
}

impl Descriptors {
    /// Merge the descriptors into one run document.
    ///
    /// `run.json` is the base; `info`, `config` and `captured_out` are set from
    /// the sibling files. A base without `artifacts` gets the artifact names.
    pub(crate) fn into_document(self, artifacts: &[String]) -> Result<Document> {
        let mut document = parse_object(&self.run, RUN_FILE)?;
        document.insert(
            INFO_KEY.to_string(),
            serde_json::Value::Object(parse_object(&self.info, INFO_FILE)?),
        );
        document.insert(
            CONFIG_KEY.to_string(),
            serde_json::Value::Object(parse_object(&self.config, CONFIG_FILE)?),
        );
        document.insert(
            CAPTURED_OUT_KEY.to_string(),
            serde_json::Value::String(captured_text(self.captured_out)),
        );
        document
            .entry(ARTIFACTS_KEY.to_string())
            .or_insert_with(|| artifacts.iter().cloned().map(serde_json::Value::from).collect());
        Ok(document)
    }
}

fn captured_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| {
        warn!("captured output is not valid UTF-8; replacing invalid sequences");
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}

/// True if `name` is one of the descriptor files rather than an artifact.
#[must_use]
pub fn is_descriptor(name: &str) -> bool {
    DESCRIPTOR_FILES.contains(&name)
}
