//! Loading and saving the edited document.
//!
//! The editor never touches the filesystem directly; it goes through a
//! [`PersistenceStore`] so saves can be tested without a real file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },
    #[error("no file to save to; start markmate with a FILE argument")]
    NoLocation,
}

/// Durable storage for one document.
pub trait PersistenceStore {
    /// Read the stored text. `Ok(None)` means nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the content exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored text with `content`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the content cannot be written.
    fn save(&self, content: &str) -> Result<(), StoreError>;

    /// Where the document lives, for display.
    fn location(&self) -> &Path;
}

/// Stores the document as a plain UTF-8 file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// failed save never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "document".into(), |n| n.to_string_lossy().into_owned());
        self.path
            .with_file_name(format!(".{name}.markmate-{}.tmp", std::process::id()))
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl PersistenceStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        String::from_utf8(bytes).map(Some).map_err(|_| StoreError::Encoding {
            path: self.path.clone(),
        })
    }

    fn save(&self, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let temp = self.temp_path();
        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(self.write_err(err));
        }
        tracing::debug!(path = %self.path.display(), bytes = content.len(), "document saved");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
