//! Scratch storage for uploads, page images and CSV artifacts.
//!
//! Every file name is derived from a per-request [`Uuid`], never from the
//! client-supplied filename, so concurrent uploads of `invoice.pdf` cannot
//! overwrite or delete each other's data.
//!
//! A [`ScratchFile`] removes its file when dropped. Holding one for the
//! duration of a stage guarantees cleanup on success, on `?` early returns
//! and on panics that unwind through the owning frame.

use crate::error::Pdf2CsvError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Root directory for all per-request scratch files.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist.
    pub fn ensure(&self) -> Result<(), Pdf2CsvError> {
        std::fs::create_dir_all(&self.root).map_err(|source| Pdf2CsvError::ScratchIo {
            path: self.root.clone(),
            source,
        })
    }

    /// Path for a request-scoped file: `<root>/<request>-<suffix>`.
    pub fn path_for(&self, request: Uuid, suffix: &str) -> PathBuf {
        self.root.join(format!("{request}-{suffix}"))
    }

    /// Path of the CSV artifact for a request: `<root>/<request>.csv`.
    pub fn artifact_path(&self, request: Uuid) -> PathBuf {
        self.root.join(format!("{request}.csv"))
    }

    /// Reserve a request-scoped file that is deleted on drop.
    ///
    /// Nothing is written; the caller creates the file at [`ScratchFile::path`].
    pub fn file(&self, request: Uuid, suffix: &str) -> ScratchFile {
        ScratchFile {
            path: self.path_for(request, suffix),
        }
    }

    /// Write `bytes` to a new request-scoped file and return its guard.
    pub async fn persist(
        &self,
        request: Uuid,
        suffix: &str,
        bytes: &[u8],
    ) -> Result<ScratchFile, Pdf2CsvError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| Pdf2CsvError::ScratchIo {
                path: self.root.clone(),
                source,
            })?;

        let file = self.file(request, suffix);
        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|source| Pdf2CsvError::ScratchIo {
                path: file.path().to_path_buf(),
                source,
            })?;
        debug!("Persisted {} bytes to {}", bytes.len(), file.path().display());
        Ok(file)
    }
}

/// A scratch file removed from disk when the guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
