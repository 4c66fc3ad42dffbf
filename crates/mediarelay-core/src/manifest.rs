//! Scoped ownership of temporary files created while serving one request

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Deletes every tracked file when dropped, unless it was released first.
///
/// Cleanup failures are logged and swallowed.
#[derive(Debug, Default)]
pub struct TempManifest {
    paths: Vec<PathBuf>,
}

impl TempManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a temp file path
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Stop tracking a path; it will survive the manifest
    pub fn release(&mut self, path: &Path) -> bool {
        match self.paths.iter().position(|p| p == path) {
            Some(pos) => {
                self.paths.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for TempManifest {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed temporary file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary file"),
            }
        }
    }
}
