//! Backing store resolution
//!
//! Turns an [`Identifier`] into an opened [`Backend`] and its raw run
//! document. Precedence is fixed: an explicit path wins, then the database,
//! then the configured storage folder. The first branch that finds the run
//! wins; if none does, the result is [`Error::NotFound`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{Backend, DatabaseBackend, DirectoryBackend, ZipBackend};
use crate::config::StoreConfig;
use crate::store::{DatabaseConnector, Document};
use crate::{Error, Result};

/// What a caller names a run by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Numeric run id, looked up in the database or the storage folder.
    Run(u64),
    /// Run directory or `.zip` archive.
    Path(PathBuf),
}

impl From<u64> for Identifier {
    fn from(id: u64) -> Self {
        Self::Run(id)
    }
}

impl From<PathBuf> for Identifier {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Identifier {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl FromStr for Identifier {
    type Err = Error;

    /// All-digit strings are run ids unless a file of that name exists.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::Other("empty identifier".to_string()));
        }
        match s.parse::<u64>() {
            Ok(id) if !Path::new(s).exists() => Ok(Self::Run(id)),
            _ => Ok(Self::Path(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(id) => write!(f, "run {id}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A run located in one backend, not yet normalized.
#[derive(Debug)]
pub struct ResolvedRun {
    /// Backend holding the run.
    pub backend: Backend,
    /// Raw run document as read from the backend.
    pub document: Document,
}

/// Locates runs according to a [`StoreConfig`].
pub struct Resolver {
    config: StoreConfig,
    connector: Option<Arc<dyn DatabaseConnector>>,
}

impl Resolver {
    /// Create a resolver; the database branch also needs a connector.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            connector: None,
        }
    }

    /// Attach the connector used when the database branch is configured.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn DatabaseConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve an identifier to a backend and its raw document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no enabled branch holds the run,
    /// [`Error::StorageError`] if the database is configured without a
    /// connector, and any load error of the matching backend.
    pub fn resolve(&self, identifier: impl Into<Identifier>) -> Result<ResolvedRun> {
        let identifier = identifier.into();
        let resolved = match &identifier {
            Identifier::Path(path) => Self::resolve_path(path)?,
            Identifier::Run(run_id) => self.resolve_run(*run_id)?,
        };
        info!(%identifier, backend = %resolved.backend.kind(), "resolved run");
        Ok(resolved)
    }

    fn resolve_path(path: &Path) -> Result<ResolvedRun> {
        if !path.exists() {
            return Err(Error::NotFound(format!("experiment {}", path.display())));
        }
        if path.is_dir() {
            open_directory(path)
        } else {
            open_zip(path)
        }
    }

    /// Database first, then the storage folder. A run the database does not
    /// hold still falls through to the folder; only a hit stops the search.
    fn resolve_run(&self, run_id: u64) -> Result<ResolvedRun> {
        if let Some(database) = &self.config.database {
            let connector = self.connector.as_ref().ok_or_else(|| {
                Error::StorageError(format!(
                    "database {} is configured but no connector was supplied",
                    database.host
                ))
            })?;
            let connection = connector.connect(database)?;
            if let Some((backend, document)) = DatabaseBackend::open(connection, run_id)? {
                return Ok(ResolvedRun {
                    backend: Backend::Database(backend),
                    document,
                });
            }
            debug!(run_id, "run not in database");
        }

        if let Some(folder) = &self.config.storage_folder {
            let dir = folder.join(run_id.to_string());
            if dir.is_dir() {
                return open_directory(&dir);
            }
            let archive = folder.join(format!("{run_id}.zip"));
            if archive.is_file() {
                return open_zip(&archive);
            }
            debug!(run_id, folder = %folder.display(), "run not in storage folder");
        }

        Err(Error::NotFound(format!("experiment {run_id}")))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("connector", &self.connector.is_some())
            .finish()
    }
}

fn open_directory(path: &Path) -> Result<ResolvedRun> {
    let (backend, document) = DirectoryBackend::open(path)?;
    Ok(ResolvedRun {
        backend: Backend::Directory(backend),
        document,
    })
}

fn open_zip(path: &Path) -> Result<ResolvedRun> {
    let (backend, document) = ZipBackend::open(path)?;
    Ok(ResolvedRun {
        backend: Backend::Zip(backend),
        document,
    })
}
