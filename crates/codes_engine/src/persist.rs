//! Settings files in the state directory.
//!
//! Files are small and rewritten whole, so a crash mid-save must leave the
//! previous settings intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot use {path:?} as the state directory: {reason}")]
    StateDir { path: PathBuf, reason: String },
    #[error("settings file I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Creates the state directory if needed. An existing non-directory is an error.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    let state_dir_error = |reason: String| PersistError::StateDir {
        path: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(state_dir_error("a file is in the way".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| state_dir_error(e.to_string()))
        }
        Err(err) => Err(state_dir_error(err.to_string())),
    }
}

/// Loads and saves whole settings files under one state directory.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `Ok(None)` before the first save.
    pub fn read(&self, filename: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.dir.join(filename)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Saves into a sibling temp file, then renames it over `filename`.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file_mut().sync_all()?;

        staged.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
