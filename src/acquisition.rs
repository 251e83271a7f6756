//! Document acquisition
//!
//! Turns whatever the host has (a path, a `file://` URI) into a source the
//! view can hand to the native surface. Downloading remote documents is the
//! host's business; remote locators are rejected here.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::view::{SourceError, SourceLocator};

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error(transparent)]
    Locator(#[from] SourceError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
}

/// Resolves a locator into a local, randomly readable document
pub trait DocumentAcquirer {
    fn acquire(&self, locator: &str) -> Result<SourceLocator, AcquireError>;
}

/// Accepts documents already present on the local filesystem
#[derive(Clone, Debug, Default)]
pub struct LocalFileAcquirer {
    base_dir: Option<PathBuf>,
}

impl LocalFileAcquirer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir` instead of the working directory
    #[must_use]
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DocumentAcquirer for LocalFileAcquirer {
    fn acquire(&self, locator: &str) -> Result<SourceLocator, AcquireError> {
        let parsed = SourceLocator::parse(locator)?;
        let path = self.absolute(&parsed.local_path());

        let io_error = |source| AcquireError::Io {
            path: path.clone(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_error)?;
        if !canonical.is_file() {
            return Err(AcquireError::NotAFile(canonical));
        }
        File::open(&canonical).map_err(io_error)?;

        debug!("Acquired local document {}", canonical.display());
        Ok(SourceLocator::parse(&format!("file://{}", canonical.display()))?)
    }
}
