//! Scoped scratch directories for per-record intermediate artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

/// A record's working directory, removed recursively when the guard drops.
///
/// Each eligible record owns a disjoint directory `{output_root}/{eventCode}/
/// {id}`, so concurrent records never share scratch state. Removal happens on
/// every exit path, success or failure, and a removal error is logged as a
/// warning rather than surfaced, because cleanup must never turn a generated
/// certificate into a failed record.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates the directory (and any missing parents). Idempotent: an
    /// already existing directory is fine.
    pub fn create(path: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(
                    "failed to clean scratch directory '{}': {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}
