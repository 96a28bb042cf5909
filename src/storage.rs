//! Reading and writing outline documents.
//!
//! Writes go through a temporary file in the target directory followed by a
//! rename, so readers (and file watchers) never observe a half-written
//! outline.

use std::io::Write;
use std::path::{Path, PathBuf};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from reading or writing documents. Both are transient: callers
/// report them and may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The document does not exist
    NotFound(PathBuf),
    /// Any other I/O failure
    Io { path: PathBuf, message: String },
}

impl StorageError {
    fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StorageError::NotFound(path) => path,
            StorageError::Io { path, .. } => path,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            StorageError::Io { path, message } => {
                write!(f, "Failed to access {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Where outline text is read from and written to.
pub trait OutlineStore {
    fn read(&self, path: &Path) -> StorageResult<String>;
    fn write(&self, path: &Path, text: &str) -> StorageResult<()>;
}

/// Local filesystem store with atomic writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl OutlineStore for FsStore {
    fn read(&self, path: &Path) -> StorageResult<String> {
        std::fs::read_to_string(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn write(&self, path: &Path, text: &str) -> StorageResult<()> {
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let io_err = |e: std::io::Error| StorageError::from_io(path, e);

        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir).map_err(io_err)?;
        temp_file.write_all(text.as_bytes()).map_err(io_err)?;
        temp_file.flush().map_err(io_err)?;

        // Same directory, so the rename stays on one filesystem
        temp_file.persist(path).map_err(|e| io_err(e.error))?;

        tracing::info!(path = %path.display(), bytes = text.len(), "wrote document");
        Ok(())
    }
}
