//! Directory backend: one run per directory on disk

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{
    is_descriptor, ArtifactStore, Descriptors, CAPTURED_OUT_FILE, CONFIG_FILE, INFO_FILE, RUN_FILE,
};
use crate::store::{ArtifactReader, Document};
use crate::{Error, Result};

/// A run stored as a directory of descriptor files plus artifact files.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    path: PathBuf,
    artifacts: Vec<String>,
}

impl DirectoryBackend {
    /// Open a run directory and assemble its run document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a descriptor file is missing, and
    /// [`Error::DecodeError`] or [`Error::Json`] if one is malformed.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Document)> {
        let path = path.into();
        let artifacts = list_artifacts(&path)?;

        let descriptors = Descriptors {
            run: read_text(&path, RUN_FILE)?,
            info: read_text(&path, INFO_FILE)?,
            config: read_text(&path, CONFIG_FILE)?,
            captured_out: read_bytes(&path, CAPTURED_OUT_FILE)?,
        };
        let document = descriptors.into_document(&artifacts)?;

        debug!(path = %path.display(), artifacts = artifacts.len(), "opened run directory");
        Ok((Self { path, artifacts }, document))
    }

    /// Run directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filesystem path of an artifact.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl ArtifactStore for DirectoryBackend {
    fn artifact_names(&self) -> &[String] {
        &self.artifacts
    }

    fn open_artifact(&self, name: &str) -> Result<ArtifactReader> {
        let file = File::open(self.artifact_path(name))
            .map_err(|err| not_found(err, &self.path, name))?;
        Ok(Box::new(file))
    }
}

/// Regular files other than the descriptors, sorted by name.
fn list_artifacts(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_descriptor(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn read_bytes(dir: &Path, name: &str) -> Result<Vec<u8>> {
    fs::read(dir.join(name)).map_err(|err| not_found(err, dir, name))
}

fn read_text(dir: &Path, name: &str) -> Result<String> {
    let bytes = read_bytes(dir, name)?;
    String::from_utf8(bytes).map_err(|_| Error::DecodeError(format!("{name} is not valid UTF-8")))
}

fn not_found(err: std::io::Error, dir: &Path, name: &str) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(format!("{name} in {}", dir.display()))
    } else {
        Error::Io(err)
    }
}
