//! Zip export in the layout the zip backend reads back

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::backend::{
    CAPTURED_OUT_FILE, CAPTURED_OUT_KEY, CONFIG_FILE, CONFIG_KEY, INFO_FILE, INFO_KEY, RUN_FILE,
};
use crate::store::Document;
use crate::Result;

/// `path` with a `.zip` extension appended unless it already ends in `.zip`.
#[must_use]
pub fn zip_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "zip") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".zip");
        PathBuf::from(name)
    }
}

/// The four descriptor entries of a run document, serialized.
///
/// `run.json` is the document minus `config`, `captured_out` and `info`.
/// Values stay in extended JSON so the archive decodes the same way the
/// database document does.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if a part cannot be serialized.
pub fn descriptor_entries(document: &Document) -> Result<[(&'static str, Vec<u8>); 4]> {
    let mut rest = document.clone();
    let config = rest.remove(CONFIG_KEY).unwrap_or_else(empty_object);
    let info = rest.remove(INFO_KEY).unwrap_or_else(empty_object);
    let captured_out = match rest.remove(CAPTURED_OUT_KEY) {
        Some(serde_json::Value::String(text)) => text.into_bytes(),
        Some(serde_json::Value::Null) | None => Vec::new(),
        Some(other) => other.to_string().into_bytes(),
    };

    Ok([
        (CONFIG_FILE, serde_json::to_vec(&config)?),
        (CAPTURED_OUT_FILE, captured_out),
        (INFO_FILE, serde_json::to_vec(&info)?),
        (RUN_FILE, serde_json::to_vec(&serde_json::Value::Object(rest))?),
    ])
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Zip archive written to a temporary file and moved into place on `finish`.
///
/// Dropping an unfinished archive removes the temporary file, so a failed
/// export never leaves a partial archive at the target path.
pub struct ArchiveExport {
    target: PathBuf,
    zip: ZipWriter<NamedTempFile>,
    options: SimpleFileOptions,
}

impl ArchiveExport {
    /// Start an export to `target`; the temporary file lives in the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn create(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = NamedTempFile::new_in(dir)?;
        Ok(Self {
            target,
            zip: ZipWriter::new(file),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        })
    }

    /// Add an entry, streaming its bytes from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates read and write failures.
    pub fn add_reader(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64> {
        self.zip.start_file(name, self.options)?;
        Ok(io::copy(reader, &mut self.zip)?)
    }

    /// Add an entry from memory.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    /// Write the central directory and rename the archive onto the target.
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing or renaming fails.
    pub fn finish(self) -> Result<PathBuf> {
        let mut file = self.zip.finish()?;
        file.as_file_mut().sync_all()?;
        file.persist(&self.target).map_err(|err| err.error)?;
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs::File;

    #[test]
    fn test_zip_path() {
        assert_eq!(zip_path(Path::new("out/run")), PathBuf::from("out/run.zip"));
        assert_eq!(zip_path(Path::new("out/run.zip")), PathBuf::from("out/run.zip"));
        assert_eq!(zip_path(Path::new("run.v2")), PathBuf::from("run.v2.zip"));
    }

    #[test]
    fn test_descriptor_entries_split() {
        let doc = json!({
            "_id": 4,
            "status": "COMPLETED",
            "config": {"lr": 0.1},
            "info": {"note": "x"},
            "captured_out": "hello\n"
        });
        let entries = descriptor_entries(doc.as_object().unwrap()).unwrap();
        let names: Vec<&str> = entries.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["config.json", "cout.txt", "info.json", "run.json"]);

        let run: serde_json::Value = serde_json::from_slice(&entries[3].1).unwrap();
        assert_eq!(run, json!({"_id": 4, "status": "COMPLETED"}));
        assert_eq!(entries[1].1, b"hello\n");
    }

    #[test]
    fn test_unfinished_export_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("run.zip");
        {
            let mut export = ArchiveExport::create(&target).unwrap();
            export.add_bytes("a.txt", b"a").unwrap();
        }
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_finished_export_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("run.zip");
        let mut export = ArchiveExport::create(&target).unwrap();
        export.add_reader("a.txt", &mut &b"alpha"[..]).unwrap();
        assert_eq!(export.finish().unwrap(), target);

        let mut archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let mut text = String::new();
        archive.by_name("a.txt").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "alpha");
    }
}
