//! Zip backend: one run per archive
//!
//! The archive is opened for the duration of each read and closed before the
//! call returns; artifact bytes are buffered so no archive handle outlives it.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{
    is_descriptor, ArtifactStore, Descriptors, CAPTURED_OUT_FILE, CONFIG_FILE, INFO_FILE, RUN_FILE,
};
use crate::store::{ArtifactReader, Document};
use crate::{Error, Result};

/// A run stored as a zip archive.
#[derive(Debug, Clone)]
pub struct ZipBackend {
    path: PathBuf,
    artifacts: Vec<String>,
}

impl ZipBackend {
    /// Open an archive and assemble its run document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a descriptor entry is missing and
    /// [`Error::Zip`] if the file is not a readable archive.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Document)> {
        let path = path.into();
        let mut archive = open_archive(&path)?;

        let mut artifacts = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if !entry.is_dir() && !is_descriptor(entry.name()) {
                artifacts.push(entry.name().to_string());
            }
        }

        let descriptors = Descriptors {
            run: read_text(&mut archive, &path, RUN_FILE)?,
            info: read_text(&mut archive, &path, INFO_FILE)?,
            config: read_text(&mut archive, &path, CONFIG_FILE)?,
            captured_out: read_entry(&mut archive, &path, CAPTURED_OUT_FILE)?,
        };
        drop(archive);
        let document = descriptors.into_document(&artifacts)?;

        debug!(path = %path.display(), artifacts = artifacts.len(), "opened run archive");
        Ok((Self { path, artifacts }, document))
    }

    /// Archive path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactStore for ZipBackend {
    fn artifact_names(&self) -> &[String] {
        &self.artifacts
    }

    fn open_artifact(&self, name: &str) -> Result<ArtifactReader> {
        let mut archive = open_archive(&self.path)?;
        let bytes = read_entry(&mut archive, &self.path, name)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

fn read_entry(
    archive: &mut ZipArchive<BufReader<File>>,
    path: &Path,
    name: &str,
) -> Result<Vec<u8>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::NotFound(format!("{name} in {}", path.display())))
        }
        Err(err) => return Err(err.into()),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn read_text(archive: &mut ZipArchive<BufReader<File>>, path: &Path, name: &str) -> Result<String> {
    let bytes = read_entry(archive, path, name)?;
    String::from_utf8(bytes).map_err(|_| Error::DecodeError(format!("{name} is not valid UTF-8")))
}
